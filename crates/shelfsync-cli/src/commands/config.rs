use super::load_settings;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{presets, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use shelf_sync_config::{Config, PathManager};

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Path => show_paths(output),
    }
}

fn show_paths(output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    let credentials_file = path_manager.credentials_file();
    let log_file = path_manager.daemon_log_file();

    match output.format() {
        OutputFormat::Human => {
            output.info(format!("Config:      {}", config_file.display()));
            output.info(format!("Credentials: {}", credentials_file.display()));
            output.info(format!("Daemon log:  {}", log_file.display()));
        }
        _ => output.json(&json!({
            "config_file": config_file,
            "credentials_file": credentials_file,
            "daemon_log_file": log_file,
        })),
    }
    Ok(())
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let (config, credentials) = load_settings()?;
    let secret = |value: Option<&String>| match value {
        Some(v) if full => v.clone(),
        Some(v) => mask_string(v),
        None => "<not set>".to_string(),
    };
    let notion_token = secret(credentials.get_notion_token());
    let weread_cookie = secret(credentials.get_weread_cookie());

    if output.format() != OutputFormat::Human {
        output.json(&json!({
            "config": config_json(&config),
            "credentials": {
                "notion_token": notion_token,
                "weread_cookie": weread_cookie,
            },
            "enabled_sources": config.get_configured_sources(),
        }));
        return Ok(());
    }

    output.info(format!("\n{}", "Configuration".bright_cyan().bold()));
    output.info(format!("File: {}\n", PathManager::default().config_file().display()));

    let mut notion = section("Notion");
    notion.add_row(vec![Cell::new("Database"), Cell::new(or_unset(&config.notion.database_id))]);
    notion.add_row(vec![Cell::new("API base"), Cell::new(&config.notion.api_base)]);
    notion.add_row(vec![Cell::new("Page size"), Cell::new(config.notion.page_size)]);
    notion.add_row(vec![Cell::new("Token"), Cell::new(&notion_token)]);
    output.info(notion.to_string());

    let mut weread = section("WeRead");
    weread.add_row(vec![Cell::new("Enabled"), flag(config.is_weread_enabled())]);
    if let Some(w) = &config.weread {
        weread.add_row(vec![Cell::new("Reader id"), Cell::new(w.vid.as_deref().unwrap_or("<from cookie>"))]);
        weread.add_row(vec![Cell::new("API base"), Cell::new(&w.api_base)]);
    }
    weread.add_row(vec![Cell::new("Cookie"), Cell::new(&weread_cookie)]);
    output.info(weread.to_string());

    let mut douban = section("Douban");
    douban.add_row(vec![Cell::new("Enabled"), flag(config.is_douban_enabled())]);
    if let Some(d) = &config.douban {
        douban.add_row(vec![Cell::new("User"), Cell::new(or_unset(&d.user_id))]);
        douban.add_row(vec![Cell::new("Blocked ids"), Cell::new(d.block_list.len())]);
        douban.add_row(vec![Cell::new("Extra ids"), Cell::new(d.extra_ids.len())]);
        douban.add_row(vec![Cell::new("Max pages"), Cell::new(d.max_pages)]);
    }
    output.info(douban.to_string());

    let mut sync = section("Sync");
    sync.add_row(vec![Cell::new("Highlights"), flag(config.sync.sync_annotations)]);
    sync.add_row(vec![Cell::new("Blocked ids"), Cell::new(config.sync.block_list.len())]);
    if let Some(scheduler) = &config.scheduler {
        sync.add_row(vec![Cell::new("Schedule"), Cell::new(&scheduler.schedule)]);
        sync.add_row(vec![Cell::new("Run on startup"), flag(scheduler.run_on_startup)]);
    }
    output.info(sync.to_string());

    if let Err(e) = config.validate() {
        output.warn(format!("Configuration is incomplete: {}", e));
    }
    Ok(())
}

fn config_json(config: &Config) -> serde_json::Value {
    serde_json::to_value(config).unwrap_or_default()
}

fn section(title: &str) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(vec![
        Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
    table
}

fn flag(on: bool) -> Cell {
    if on {
        Cell::new("✓").fg(Color::Green)
    } else {
        Cell::new("✗").fg(Color::Red)
    }
}

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "<not set>"
    } else {
        value
    }
}

fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return "<not set>".to_string();
    }
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
