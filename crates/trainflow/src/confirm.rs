//! 対話的な確認プロンプト

use colored::Colorize;
use trainflow_cloud::Confirm;

/// stdinからの [y/N] 確認
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> std::io::Result<bool> {
        use std::io::Write;

        print!("{} [y/N]: ", prompt.cyan());
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        Ok(input.trim().eq_ignore_ascii_case("y"))
    }
}
