//! `protoc` argument vector construction, in the same spirit as buffrs'
//! `Generator::Protoc::run` match arm: `--proto_path` first, then the
//! caller-supplied language flags, then every input file.

const INPUT_MOUNT: &str = "/input";

pub fn build_protoc_argv(proto_paths: &[String], flags: &[String]) -> Vec<String> {
    let mut argv = vec![format!("--proto_path={INPUT_MOUNT}")];
    argv.extend(flags.iter().cloned());
    argv.extend(proto_paths.iter().map(|path| format!("{INPUT_MOUNT}/{path}")));
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_proto_path_before_flags_before_inputs() {
        let argv = build_protoc_argv(
            &["a.proto".to_owned(), "b.proto".to_owned()],
            &["--go_out=/output".to_owned()],
        );
        assert_eq!(
            argv,
            vec![
                "--proto_path=/input".to_owned(),
                "--go_out=/output".to_owned(),
                "/input/a.proto".to_owned(),
                "/input/b.proto".to_owned(),
            ]
        );
    }
}
