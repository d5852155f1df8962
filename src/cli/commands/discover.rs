//! `marginalia discover`

use marginalia_config::Config;
use marginalia_llm::discovery;

use crate::exit_codes::ExitCode;

pub fn execute(config: &Config, binary: Option<&str>) -> Result<(), ExitCode> {
    let configured = binary.or_else(|| config.claude_binary());

    if let Some(path) = discovery::discover(configured) {
        println!("{}", path.display());
        return Ok(());
    }

    let locations = discovery::global().locations();
    eprintln!("✗ claude CLI binary not found");
    eprintln!("\n  Searched:");
    if let Some(path) = configured {
        eprintln!("    • {path} (configured)");
    }
    for path in [&locations.user_local, &locations.system].into_iter().flatten() {
        eprintln!("    • {}", path.display());
    }
    if let Some(locate) = &locations.locate_command {
        eprintln!("    • PATH ({locate} {})", locations.binary_name);
    }
    eprintln!("\n  Suggestions:");
    eprintln!("    • Install the claude CLI, or");
    eprintln!("    • Set binary under [llm.claude] in .marginalia/config.toml, or pass --binary");
    Err(ExitCode::INTERNAL)
}
