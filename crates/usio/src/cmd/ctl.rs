use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use usio_transport::ControlListener;

use crate::cmd::CtlArgs;
use crate::exit::{io_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: CtlArgs) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let query = args.command.join(" ");
    if query.contains('\n') {
        return Err(CliError::new(USAGE, "query must be a single line"));
    }

    let stream = ControlListener::connect(&args.socket)
        .map_err(|err| transport_error("can't connect to daemon", err))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|err| transport_error("can't set reply timeout", err))?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|err| transport_error("can't set send timeout", err))?;
    let mut writer = stream
        .try_clone()
        .map_err(|err| transport_error("can't clone control stream", err))?;

    writer
        .write_all(format!("{query}\n").as_bytes())
        .map_err(|err| io_error("can't send query", err))?;

    let mut reply = String::new();
    let read = BufReader::new(stream)
        .read_line(&mut reply)
        .map_err(|err| io_error("no reply from daemon", err))?;
    if read == 0 {
        return Err(CliError::new(FAILURE, "daemon closed the connection"));
    }

    let format = args.format.unwrap_or_else(OutputFormat::default_for_stdout);
    print_reply(&query, reply.trim_end(), format);
    Ok(SUCCESS)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
