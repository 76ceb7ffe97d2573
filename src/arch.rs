//! CPU architecture triplet mapping

/// Map a package architecture identifier to its GNU multiarch triplet.
///
/// Unknown identifiers fall back to `<arch>-linux-gnu` so that lookups
/// still point somewhere sensible on exotic ports.
pub fn triplet(arch: &str) -> String {
    match arch {
        "amd64" => "x86_64-linux-gnu".to_string(),
        "armhf" => "arm-linux-gnueabihf".to_string(),
        "arm64" => "aarch64-linux-gnu".to_string(),
        other => format!("{}-linux-gnu", other),
    }
}
