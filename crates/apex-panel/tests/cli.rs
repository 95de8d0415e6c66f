use std::process::Command;

fn apex() -> Command {
    Command::new(env!("CARGO_BIN_EXE_apex"))
}

#[test]
fn help_lists_the_flags() {
    let out = apex().arg("--help").output().expect("run apex --help");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    for flag in ["--config", "--seed", "--no-visualizer"] {
        assert!(text.contains(flag), "missing {flag} in:\n{text}");
    }
}

#[test]
fn rejects_a_bad_seed() {
    let out = apex()
        .args(["--seed", "not-a-number"])
        .output()
        .expect("run apex");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("--seed"));
}
