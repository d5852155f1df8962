//! `marginalia config`

use marginalia_config::Config;

use crate::exit_codes::ExitCode;

pub fn execute(config: &Config) -> Result<(), ExitCode> {
    print!("{}", render(config));
    Ok(())
}

fn render(config: &Config) -> String {
    let mut out = String::from("Effective configuration:\n");
    match &config.config_file {
        Some(path) => out.push_str(&format!("  file: {}\n\n", path.display())),
        None => out.push_str("  file: (none, using defaults)\n\n"),
    }

    let settings = config.effective_config();
    let width = settings.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &settings {
        out.push_str(&format!("  {key:<width$} = {value}  [{source}]\n"));
    }
    out
}
