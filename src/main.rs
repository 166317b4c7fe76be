use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let workspace_root = match std::env::args_os().nth(1) {
        Some(root) => PathBuf::from(root),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(error) => {
                eprintln!("error: cannot resolve workspace root: {error}");
                return ExitCode::FAILURE;
            }
        },
    };

    match schedule_core::run(&workspace_root).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
