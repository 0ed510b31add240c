// main.rs
use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use shoesapp::api::ErrorResponse;
use shoesapp::config::CONFIG;
use shoesapp::engine::{EngineError, EngineResult, Resource, ShopEngine, ShopEngineBuilder, Subject};
use shoesapp::schema::Record;

const HELP: &str = "\
命令:
  find <实体> [查询串]     例: find sizes name.contains=AA&sort=id,desc
  count <实体> [查询串]    例: count products price.greaterThan=50
  get <实体> <id>
  delete <实体> <id>
  favorites <userId>
  bills <userId>
  unlike <userId> <productId>
  stats
  quit
实体: sizes categories products bills favorites";

fn main() -> Result<()> {
    // RUST_LOG 优先，否则使用配置文件中的过滤规则
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&CONFIG.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let engine = ShopEngineBuilder::new().build()?;

    // 带参数时只执行一条命令
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        print_outcome(execute(&engine, &args.join(" ")))?;
        return Ok(());
    }

    println!("--- shoesapp 查询终端 ---");
    println!(" [存储] {:?} 后端", engine.config().storage.backend);
    println!(" [提示] 输入 help 查看命令 (输入 'quit' 退出)");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input == "quit" || input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }
        if input == "help" {
            println!("{}", HELP);
            continue;
        }

        print_outcome(execute(&engine, input))?;
    }

    Ok(())
}

fn print_outcome(outcome: EngineResult<Value>) -> Result<()> {
    match outcome {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(e) => println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?),
    }
    Ok(())
}

fn to_json<T: Serialize>(value: T) -> EngineResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn usage(message: &str) -> EngineError {
    EngineError::bad_request("command", "usage", format!("{}\n{}", message, HELP))
}

fn parse_id(raw: Option<&str>, name: &str) -> EngineResult<i64> {
    raw.and_then(|s| s.parse().ok())
        .ok_or_else(|| usage(&format!("missing or invalid {}", name)))
}

fn subject(raw: Option<&str>) -> EngineResult<Subject> {
    let user_id = parse_id(raw, "userId")?;
    Ok(Subject::new(user_id, format!("user-{}", user_id)))
}

/// 执行一条命令，返回 JSON 结果
fn execute(engine: &ShopEngine, line: &str) -> EngineResult<Value> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match command {
        "find" | "count" | "get" | "delete" => {
            let entity = args.first().copied().ok_or_else(|| usage("missing entity"))?;
            let rest = &args[1..];
            match entity {
                "sizes" => entity_command(engine.sizes(), command, rest),
                "categories" => entity_command(engine.categories(), command, rest),
                "products" => entity_command(engine.products(), command, rest),
                "bills" => entity_command(engine.bills(), command, rest),
                "favorites" => entity_command(engine.favorites(), command, rest),
                other => Err(usage(&format!("unknown entity: {}", other))),
            }
        }
        "favorites" => {
            let subject = subject(args.first().copied())?;
            to_json(engine.favorites().service().favorites_of(Some(&subject))?)
        }
        "bills" => {
            let subject = subject(args.first().copied())?;
            to_json(engine.bills().service().bills_of(Some(&subject))?)
        }
        "unlike" => {
            let subject = subject(args.first().copied())?;
            let product_id = parse_id(args.get(1).copied(), "productId")?;
            let removed = engine.favorites().service().unlike(Some(&subject), product_id)?;
            Ok(serde_json::json!({ "removed": removed }))
        }
        "stats" => to_json(engine.stats()?),
        other => Err(usage(&format!("unknown command: {}", other))),
    }
}

fn entity_command<R: Record>(resource: &Resource<R>, command: &str, args: &[&str]) -> EngineResult<Value> {
    let query = args.first().copied().unwrap_or_default();
    match command {
        "find" => to_json(resource.list(query)?),
        "count" => to_json(resource.count(query)?),
        "get" => to_json(resource.get(parse_id(args.first().copied(), "id")?)?),
        _ => {
            resource.delete(parse_id(args.first().copied(), "id")?)?;
            Ok(Value::Null)
        }
    }
}
