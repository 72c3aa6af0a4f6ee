use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn runs_without_arguments() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.assert().success();
}

#[test]
fn sums_console_input() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("run").arg("tests/files/sum.asm").write_stdin("3\n4\n0\n");

    cmd.assert()
        .success()
        .stdout(contains("\n7\n"))
        .stdout(contains("Halted"));
}

#[test]
fn path_shortcut_runs() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("tests/files/countdown.asm");

    cmd.assert()
        .success()
        .stdout(contains("3\n2\n1\n"))
        .stdout(contains("Halted"));
}

#[test]
fn reads_input_from_file() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("run")
        .arg("tests/files/sum.asm")
        .arg("--input")
        .arg("tests/files/input.txt");

    cmd.assert().success().stdout(contains("\n42\n"));
}

#[test]
fn subroutine_returns() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("run").arg("tests/files/call.asm");

    cmd.assert().success().stdout(contains("\n42\n"));
}

#[test]
fn division_by_zero_fails() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("run").arg("tests/files/divzero.asm");

    cmd.assert()
        .failure()
        .stdout(contains("Faulted"))
        .stderr(contains("faulted at address 4"))
        .stderr(contains("Divided by zero"));
}

#[test]
fn exhausted_input_fails() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("run").arg("tests/files/sum.asm").write_stdin("5\n");

    cmd.assert().failure().stdout(contains("Faulted"));
}

#[test]
fn dumps_state_after_run() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("run")
        .arg("tests/files/sum.asm")
        .arg("--dump")
        .write_stdin("2\n0\n");

    cmd.assert()
        .success()
        .stdout(contains("PC:  0"))
        .stdout(contains("   50: 2"))
        .stdout(contains("loop -> 3"))
        .stdout(contains("stdout -> 0"));
}

#[test]
fn dump_without_running() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("dump").arg("tests/files/countdown.asm");

    cmd.assert()
        .success()
        .stdout(contains("PC:  1"))
        .stdout(contains("    4: brp 2"));
}

#[test]
fn verbose_traces_cycles() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("run").arg("tests/files/countdown.asm").arg("--verbose");

    cmd.assert()
        .success()
        .stderr(contains("5 instructions loaded"))
        .stderr(contains("fetch      AR=1 IR=set 3"))
        .stderr(contains("increment  PC=2"));
}

#[test]
fn check_reports_problems() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("check").arg("tests/files/sloppy.asm");

    cmd.assert()
        .success()
        .stdout(contains("line 3"))
        .stdout(contains("label `missing` is never defined"))
        .stdout(contains("line 5: literal `99999999999999999999` is out of range"))
        .stdout(contains("4 instructions"));
}

#[test]
fn check_clean_file() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("check").arg("tests/files/call.asm");

    cmd.assert().success().stdout(contains("no problems found!"));
}

#[test]
fn rejects_unknown_extension() {
    let mut cmd = Command::cargo_bin("oneaddr").unwrap();
    cmd.arg("run").arg("Cargo.toml");

    cmd.assert().failure();
}
