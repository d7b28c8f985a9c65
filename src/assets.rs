use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/assets"]
pub struct Assets;

pub const DEFAULT_CONFIG_FILE: &str = "default-config.json";

/// Embedded default config, as shipped with the binary
pub fn get_default_config() -> Option<String> {
    let file = Assets::get(DEFAULT_CONFIG_FILE)?;
    String::from_utf8(file.data.into_owned()).ok()
}
