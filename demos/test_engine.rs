// 测试 ShopEngine
use shoesapp::config::{AppConfig, StorageBackend};
use shoesapp::engine::{SeedData, ShopEngineBuilder, Subject};
use shoesapp::schema::{Favorite, Product, Size};
use std::fs;
use std::sync::Arc;

fn main() {
    println!("=== ShopEngine 功能测试 ===\n");

    // 使用临时目录
    let temp_dir = std::env::temp_dir().join("shoesapp_test");
    let _ = fs::remove_dir_all(&temp_dir);

    println!("1. 创建 ShopEngine (sled)...");
    let seed = SeedData {
        sizes: vec![Size::new("AAAA"), Size::new("BBBB")],
        products: vec![
            Product::new("Runner", 80.0, "runner.png", 41),
            Product::new("Boot", 120.0, "boot.png", 42),
        ],
        favorites: vec![Favorite::new(3, 1), Favorite::new(3, 2)],
        ..SeedData::default()
    };
    let engine = ShopEngineBuilder::new()
        .with_config(Arc::new(AppConfig::default()))
        .with_backend(StorageBackend::Sled)
        .with_storage_path(&temp_dir)
        .with_seed(seed)
        .build();

    let engine = match engine {
        Ok(engine) => {
            println!("   ✓ 引擎创建成功\n");
            engine
        }
        Err(e) => {
            println!("   ✗ 引擎创建失败: {}", e);
            return;
        }
    };

    // 测试统计
    println!("2. 获取统计...");
    match engine.stats() {
        Ok(stats) => println!("   ✓ {:?}\n", stats),
        Err(e) => println!("   ✗ 统计失败: {}\n", e),
    }

    // 测试条件查询
    println!("3. 条件查询 sizes: name.contains=AAAA");
    match engine.sizes().list("name.contains=AAAA") {
        Ok(page) => println!("   ✓ 找到 {} 条: {:?}\n", page.total_elements, page.content),
        Err(e) => println!("   ✗ 查询失败: {}\n", e),
    }

    // 测试计数
    println!("4. 计数 products: price.greaterThan=100");
    match engine.products().count("price.greaterThan=100") {
        Ok(n) => println!("   ✓ 数量: {}\n", n),
        Err(e) => println!("   ✗ 计数失败: {}\n", e),
    }

    // 测试错误
    println!("5. 未知字段...");
    match engine.sizes().count("weight.equals=1") {
        Ok(_) => println!("   ✗ 应该失败\n"),
        Err(e) => println!("   ✓ 错误: {}\n", e),
    }

    // 测试取消收藏
    println!("6. 用户 3 取消收藏商品 2...");
    let subject = Subject::new(3, "alice");
    match engine.favorites().service().unlike(Some(&subject), 2) {
        Ok(removed) => println!("   ✓ 删除 {} 条\n", removed),
        Err(e) => println!("   ✗ 失败: {}\n", e),
    }

    // 清理
    drop(engine);
    let _ = fs::remove_dir_all(&temp_dir);

    println!("=== 测试完成 ===");
}
