use anyhow::Context;
use rangeprune_pruner::PruneOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use toml_edit::{value, DocumentMut};

trait ConfigSerializeDefault {
    fn fix_config(self, name: &str, doc: &mut DocumentMut);
}

macro_rules! impl_simple_default {
    ( $( $type:ty ),* ) => {
        $(
            impl ConfigSerializeDefault for $type {
                fn fix_config(self, name: &str, doc: &mut DocumentMut) {
                    doc.entry(name).or_insert_with(|| value(self));
                }
            }
        )*
    }
}

impl_simple_default!(String, bool);

macro_rules! gen_config {
    (
        $( $(#[$attr:meta])* $name:ident: $type:ty = $default:expr),*
    ) => {
        #[derive(Debug, Serialize, Deserialize)]
        pub struct PruneConfig {
            $(
                $(#[$attr])*
                pub $name: $type,
            )*
        }

        impl PruneConfig {
            /// Reads the config file at `path`, filling in every missing key with its default.
            /// A missing file yields the defaults. With `write_back` set, the completed document
            /// is written back so the file lists every key.
            pub fn load(path: &Path, write_back: bool) -> anyhow::Result<PruneConfig> {
                let str = match fs::read_to_string(path) {
                    Ok(str) => str,
                    Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
                    Err(err) => {
                        return Err(err).with_context(|| {
                            format!("failed to read config file '{}'", path.display())
                        })
                    }
                };
                let mut doc = str
                    .parse::<DocumentMut>()
                    .with_context(|| format!("failed to parse config file '{}'", path.display()))?;

                $(
                    <$type as ConfigSerializeDefault>::fix_config($default, stringify!($name), &mut doc);
                )*

                let patched = doc.to_string();
                if write_back && str != patched {
                    fs::write(path, &patched).with_context(|| {
                        format!("failed to write config file '{}'", path.display())
                    })?;
                }

                toml::from_str(&patched)
                    .with_context(|| format!("invalid config file '{}'", path.display()))
            }
        }
    };
}

gen_config! {
    /// Fold straight line chains after pruning
    merge_blocks: bool = true,
    /// Remove unreachable loops after pruning
    sweep_unreachable: bool = true,
    /// Verify every function after each pass
    verify_each: bool = false,
    /// Log every function after each pass
    print_after_all: bool = false,
    /// Pass flags applied after the settings above, like "--no-merge -v"
    options: String = String::new(),
    /// Used when `RANGEPRUNE_LOG` is not set
    log_filter: String = "info".to_string()
}

impl PruneConfig {
    pub fn prune_options(&self) -> PruneOptions {
        let mut options = PruneOptions {
            merge_blocks: self.merge_blocks,
            sweep_unreachable: self.sweep_unreachable,
            verify_each: self.verify_each,
            print_after_all: self.print_after_all,
        };
        options.apply(&self.options);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("rangeprune-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = PruneConfig::load(&scratch_path("missing"), false).unwrap();
        assert_eq!(config.prune_options(), PruneOptions::default());
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn fills_in_missing_keys() {
        let path = scratch_path("partial");
        fs::write(&path, "# tuned for debugging\nmerge_blocks = false\n").unwrap();

        let config = PruneConfig::load(&path, true).unwrap();
        assert!(!config.merge_blocks);
        assert!(config.sweep_unreachable);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# tuned for debugging\nmerge_blocks = false\n"));
        assert!(written.contains("log_filter = \"info\""));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn option_flags_apply_last() {
        let path = scratch_path("flags");
        fs::write(&path, "merge_blocks = true\noptions = \"-m --verify\"\n").unwrap();

        let options = PruneConfig::load(&path, false).unwrap().prune_options();
        assert!(!options.merge_blocks);
        assert!(options.verify_each);
        assert!(options.sweep_unreachable);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rejects_wrong_types() {
        let path = scratch_path("invalid");
        fs::write(&path, "verify_each = \"yes\"\n").unwrap();
        assert!(PruneConfig::load(&path, false).is_err());
        fs::remove_file(&path).unwrap();
    }
}
