use std::io::Write;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use console::style;
use fern::colors::{Color, ColoredLevelConfig};
use log::{Level, LevelFilter};
use ms::{__to_string__, ms};
use tabwriter::TabWriter;

pub fn set_hook() {
    // setup a panic hook to easily exit the program on panic
    std::panic::set_hook(Box::new(|panic_info| {
        // print the panic message
        let message = if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.clone()
        } else if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else {
            format!("{panic_info:?}")
        };

        log::error!("{message}");

        #[cfg(debug_assertions)]
        log::debug!("{panic_info}");

        std::process::exit(1);
    }));
}

pub fn logs(verbose: bool) {
    let colors = ColoredLevelConfig::new()
        .info(Color::BrightCyan)
        .error(Color::BrightRed)
        .warn(Color::BrightYellow)
        .debug(Color::BrightWhite)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let level = record.level();

            match level {
                Level::Debug | Level::Trace => out.finish(format_args!(
                    "{} [{}]: {}",
                    colors.color(level).to_string().to_lowercase(),
                    record.target(),
                    message
                )),

                level => out.finish(format_args!(
                    "{}: {}",
                    colors.color(level).to_string().to_lowercase(),
                    message
                )),
            }
        })
        .level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        // dependencies are only interesting when debugging them
        .level_for("rustls", LevelFilter::Warn)
        .level_for("tungstenite", LevelFilter::Info)
        .level_for("reqwest", LevelFilter::Info)
        .chain(
            fern::Dispatch::new()
                .filter(|metadata| !matches!(metadata.level(), Level::Error | Level::Warn))
                .chain(std::io::stdout()),
        )
        .chain(
            fern::Dispatch::new()
                .level(log::LevelFilter::Warn)
                .chain(std::io::stderr()),
        )
        .apply()
        .ok();
}

/// `in 4 minutes` / `2 hours ago`
pub fn relative_time(date: DateTime<Utc>) -> String {
    let millis = date.timestamp_millis() - Utc::now().timestamp_millis();

    let human = ms!(millis.unsigned_abs(), true);

    if millis >= 0 {
        format!("in {human}")
    } else {
        format!("{human} ago")
    }
}

pub fn urlify(s: &str) -> String {
    style(s).bold().underlined().to_string()
}

/// Aligns tab separated rows.
pub fn format_table(header: Option<&str>, rows: &[String]) -> Result<Vec<String>> {
    let mut tw = TabWriter::new(vec![]);

    if let Some(header) = header {
        writeln!(&mut tw, "{header}")?;
    }

    for row in rows {
        writeln!(&mut tw, "{row}")?;
    }

    let buffer = tw
        .into_inner()
        .map_err(|e| anyhow!("Failed to format table: {}", e.error()))?;

    Ok(String::from_utf8(buffer)?
        .lines()
        .map(std::string::ToString::to_string)
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_table() {
        let lines = format_table(
            Some("LABEL\tPATH"),
            &["Grupos\t/teams".to_string(), "Usuários\t/users".to_string()],
        )
        .unwrap();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Grupos"));
        assert!(lines[2].contains("/users"));
    }

    #[test]
    fn test_relative_time_direction() {
        assert!(relative_time(Utc::now() + chrono::Duration::minutes(5)).starts_with("in "));
        assert!(relative_time(Utc::now() - chrono::Duration::minutes(5)).ends_with(" ago"));
    }
}
