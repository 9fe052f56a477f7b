use std::path::Path;

use crate::cmd::CheckConfigArgs;
use crate::config::DaemonConfig;
use crate::exit::{config_error, CliResult, SUCCESS};

pub fn run(args: CheckConfigArgs, path: &Path) -> CliResult<i32> {
    let config = DaemonConfig::load(path).map_err(config_error)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(SUCCESS);
    }

    println!("config: {}", path.display());
    println!("uart_dev: {}", config.uart_dev.display());
    println!("uart_speed: {}", config.uart_speed);
    match config.response_timeout {
        0 => println!("response_timeout: (wait indefinitely)"),
        ms => println!("response_timeout: {ms} ms"),
    }
    println!("repeat_count: {}", config.repeat_count);
    println!("exec_path: {}", config.exec_path.display());
    match &config.exec_script {
        Some(script) => println!("exec_script: {}", script.display()),
        None => println!("exec_script: (none)"),
    }
    println!("control_socket: {}", config.control_socket.display());
    match config.pending_max_age {
        Some(age) => println!("pending_max_age: {age} ms"),
        None => println!("pending_max_age: (unbounded)"),
    }
    println!("tx_queue_capacity: {}", config.tx_queue_capacity);

    Ok(SUCCESS)
}
