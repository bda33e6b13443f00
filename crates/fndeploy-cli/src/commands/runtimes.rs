use super::{json_pretty, EXIT_SUCCESS};
use fndeploy_runtime::SUPPORTED_RUNTIMES;

pub fn run(json: bool) -> Result<u8, String> {
    if json {
        println!("{}", json_pretty(&SUPPORTED_RUNTIMES)?);
        return Ok(EXIT_SUCCESS);
    }
    for family in SUPPORTED_RUNTIMES {
        println!(
            "{:<10} {} (default {})",
            family.name,
            family.kinds.join(", "),
            family.default_kind()
        );
    }
    Ok(EXIT_SUCCESS)
}
