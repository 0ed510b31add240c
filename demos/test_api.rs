// 测试 API 请求/响应类型
use shoesapp::api::{ErrorResponse, ListRequest, Page, RequestOptions};
use shoesapp::engine::EngineError;
use shoesapp::schema::{Product, Size};

fn main() {
    println!("=== API 类型功能测试 ===\n");

    let options = RequestOptions::default();

    // 测试1: ListRequest 解析
    match ListRequest::parse::<Product>(
        "price.greaterThan=50&sort=price,desc&sort=name&page=1&size=10&cacheBuster=1650000000",
        &options,
    ) {
        Ok(request) => {
            println!("1. ListRequest:");
            println!("   criteria: {}", request.criteria);
            println!("   page: {}, size: {}", request.page.page, request.page.size);
            println!("   sort: {:?}\n", request.page.sort);
        }
        Err(e) => println!("1. 解析失败: {}\n", e),
    }

    // 测试2: Page 序列化
    let page = Page::new(vec![Size::new("38").with_id(1), Size::new("39").with_id(2)], 5, 0, 2);
    println!("2. Page:");
    println!("   total_pages: {}", page.pagination.total_pages);
    println!("   has_more: {}", page.pagination.has_more);
    match serde_json::to_string_pretty(&page) {
        Ok(json) => println!("   JSON:\n{}\n", json),
        Err(e) => println!("   序列化失败: {}\n", e),
    }

    // 测试3: 错误响应
    let errors = vec![
        ListRequest::parse::<Size>("size=0", &options).err(),
        ListRequest::parse::<Size>("weight.equals=1", &options).err(),
        Some(EngineError::bad_request("size", "idexists", "A new size cannot already have an ID")),
        Some(EngineError::Unauthenticated),
    ];
    println!("3. ErrorResponse:");
    for err in errors.iter().flatten() {
        let resp = ErrorResponse::from(err);
        println!("   [{}] {} - {}", resp.status, resp.code, resp.message);
    }

    println!("\n=== 测试完成 ===");
}
