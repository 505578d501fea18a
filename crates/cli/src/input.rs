// Input loading shared by every command that takes a balance sheet

use std::path::Path;

use ledgerlens_config::Settings;
use ledgerlens_io::{LoadOptions, LoadedTable};

use crate::{CliError, LoadArgs};

/// Command-line flags override the `analysis` section of settings.
pub fn load_options(settings: &Settings, args: &LoadArgs) -> Result<LoadOptions, CliError> {
    let delimiter = match args.delimiter {
        None => None,
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => {
            return Err(CliError::usage(format!("delimiter must be a single ASCII character, got '{c}'"))
                .with_hint("for tab-separated files use a .tsv extension or --delimiter $'\\t'"));
        }
    };

    Ok(LoadOptions {
        has_headers: settings.analysis.has_headers && !args.no_headers,
        sheet: args.sheet.clone(),
        delimiter,
    })
}

pub fn load_table(settings: &Settings, path: &Path, args: &LoadArgs) -> Result<LoadedTable, CliError> {
    let options = load_options(settings, args)?;
    ledgerlens_io::load(path, &options).map_err(CliError::load)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(delimiter: Option<char>, no_headers: bool) -> LoadArgs {
        LoadArgs { sheet: None, no_headers, delimiter }
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings::default();
        let options = load_options(&settings, &args(Some(';'), true)).unwrap();
        assert!(!options.has_headers);
        assert_eq!(options.delimiter, Some(b';'));
    }

    #[test]
    fn test_settings_disable_headers() {
        let mut settings = Settings::default();
        settings.analysis.has_headers = false;
        assert!(!load_options(&settings, &args(None, false)).unwrap().has_headers);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let err = load_options(&Settings::default(), &args(Some('§'), false)).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }
}
