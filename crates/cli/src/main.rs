use std::process::ExitCode;

fn main() -> ExitCode {
    recipebot_cli::run()
}
