// 测试条件解析功能
use shoesapp::query::{CriteriaParser, FilterBuilder};
use shoesapp::schema::{Product, Size};

fn main() {
    let parser = CriteriaParser::<Size>::new();

    println!("=== 条件解析器功能测试 ===\n");

    // 测试1: 简单条件
    let c1 = parser.parse("name.contains=AAAA");
    println!("1. 简单条件: \"name.contains=AAAA\"");
    println!("   解析结果: {:?}\n", c1.map(|c| c.to_string()));

    // 测试2: 列表条件
    let c2 = parser.parse("id.in=1,2,3&distinct=true");
    println!("2. 列表条件: \"id.in=1,2,3&distinct=true\"");
    println!("   解析结果: {:?}\n", c2.map(|c| c.to_string()));

    // 测试3: 同一字段两个操作符，后者生效
    let c3 = parser.parse("id.greaterThan=1&id.lessThan=5");
    println!("3. 重复字段: \"id.greaterThan=1&id.lessThan=5\"");
    println!("   解析结果: {:?}\n", c3.map(|c| c.to_string()));

    // 测试4: 未知字段
    let c4 = parser.parse("weight.equals=3");
    println!("4. 未知字段: \"weight.equals=3\"");
    println!("   错误: {:?}\n", c4.err());

    // 测试5: 文本字段不能比较大小
    let c5 = parser.parse("name.greaterThan=A");
    println!("5. 不适用的操作符: \"name.greaterThan=A\"");
    println!("   错误: {:?}\n", c5.err());

    // 测试6: 非法数值
    let c6 = CriteriaParser::<Product>::new().parse("price.lessThan=cheap");
    println!("6. 非法数值: \"price.lessThan=cheap\"");
    println!("   错误: {:?}\n", c6.err());

    // 测试7: 构建谓词并过滤
    let sizes = vec![Size::new("AAAA").with_id(1), Size::new("BBBB").with_id(2)];
    if let Ok(criteria) = parser.parse("name.doesNotContain=AAAA") {
        match FilterBuilder::<Size>::new().build_specification(Some(&criteria)) {
            Ok(spec) => {
                println!("7. 过滤: {}", criteria);
                println!("   结果: {:?}\n", spec.apply(sizes));
            }
            Err(e) => println!("7. 构建失败: {}\n", e),
        }
    }

    println!("=== 测试完成 ===");
}
