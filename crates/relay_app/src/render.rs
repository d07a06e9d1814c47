use std::io::{self, Write};
use std::sync::Mutex;

use relay_core::{AlertKind, AlertView, ChatExchange, ChatStatus, StageView};
use relay_engine::ExchangeObserver;

pub fn alert_line(alert: &AlertView) -> String {
    let tag = match alert.kind {
        AlertKind::Info => "info",
        AlertKind::Success => "ok",
        AlertKind::Warning => "warning",
        AlertKind::Error => "error",
    };
    format!("[{tag}] {}", alert.message)
}

pub fn print_options(stage: &StageView) {
    if let Some(error) = &stage.error {
        println!("{} options unavailable: {}", stage.id, error);
        return;
    }
    for option in &stage.options {
        if option.key == option.label {
            println!("{}", option.key);
        } else {
            println!("{:<28} {}", option.key, option.label);
        }
    }
}

/// Prints each newly appended part of the answer as it arrives.
#[derive(Default)]
pub struct TerminalObserver {
    printed: Mutex<usize>,
}

impl ExchangeObserver for TerminalObserver {
    fn on_update(&self, exchange: &ChatExchange) {
        let Ok(mut printed) = self.printed.lock() else {
            return;
        };
        let answer = exchange.buffered_answer();
        if let Some(delta) = answer.get(*printed..) {
            let mut stdout = io::stdout().lock();
            let _ = stdout.write_all(delta.as_bytes());
            let _ = stdout.flush();
        }
        *printed = answer.len();
    }

    fn on_status(&self, exchange: &ChatExchange) {
        match exchange.status() {
            ChatStatus::Sending => {
                if let Ok(mut printed) = self.printed.lock() {
                    *printed = 0;
                }
            }
            ChatStatus::Complete | ChatStatus::Failed => {
                if !exchange.buffered_answer().is_empty() {
                    println!();
                }
            }
            ChatStatus::Idle | ChatStatus::Streaming => {}
        }
    }
}
