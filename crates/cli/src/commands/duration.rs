use recipebot_core::duration::parse_duration_seconds;

use crate::commands::{CommandResult, EXIT_INPUT};

pub fn run(token: &str) -> CommandResult {
    match parse_duration_seconds(token) {
        Ok(seconds) => CommandResult::success("duration", seconds),
        Err(error) => {
            CommandResult::failure("duration", "duration_parse", error.to_string(), EXIT_INPUT)
        }
    }
}
