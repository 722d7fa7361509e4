use flate2::write::GzEncoder;
use flate2::Compression;

/// Build an in-memory `.tar.gz` from `(path, contents, mode)` triples.
pub fn tar_gz(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
    for (path, data, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *data)
            .expect("appending tar entry");
    }
    builder
        .into_inner()
        .and_then(|gz| gz.finish())
        .expect("finishing tar.gz")
}

/// A release archive shaped like the real one: `<dir>/<exe>` (executable
/// shell script), a bundled `<dir>/config.json` and a `<dir>/SHA256SUMS`.
pub fn miner_archive(dir: &str, exe: &str, script: &str) -> Vec<u8> {
    let exe_path = format!("{dir}/{exe}");
    let config_path = format!("{dir}/config.json");
    let sums_path = format!("{dir}/SHA256SUMS");
    tar_gz(&[
        (exe_path.as_str(), script.as_bytes(), 0o755),
        (config_path.as_str(), br#"{"autosave": true}"#, 0o644),
        (sums_path.as_str(), b"deadbeef  miner\n", 0o644),
    ])
}
