// End-to-end tests running the snazy binary

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};
use tempfile::{NamedTempFile, TempDir};

fn snazy() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_snazy"));
    cmd.env_remove("SNAZY_LEVEL_SYMBOLS")
        .env_remove("SNAZY_KAIL_PREFIX_FORMAT")
        .env_remove("SNAZY_TIME_FORMAT")
        .env_remove("SNAZY_CONFIG")
        .env_remove("SNAZY_LOG");
    cmd
}

fn input_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn run_on(contents: &str, args: &[&str]) -> Output {
    let file = input_file(contents);
    snazy()
        .args(args)
        .arg(file.path())
        .output()
        .unwrap()
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "snazy failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_show_help() {
    let output = snazy().arg("--help").output().unwrap();
    assert!(stdout_of(&output).contains("You just need to pipe to snazy some logs formatted as json"));
}

#[test]
fn test_simple_parsing() {
    let output = run_on(r#"{"level":"info","msg":"started","port":8080}"#, &[]);
    assert_eq!(stdout_of(&output), "INFO  started port=8080\n");
}

#[test]
fn test_simple_date() {
    let output = run_on(
        r#"{"level":"info", "ts": "2022-04-25T14:20:32.505637358Z", "msg":"foo"}"#,
        &[],
    );
    assert_eq!(stdout_of(&output), "14:20:32 INFO  foo\n");
}

#[test]
fn test_floated_date() {
    let output = run_on(r#"{"level":"info", "ts": 1650602040.6289625, "msg":"foo"}"#, &[]);
    assert_eq!(stdout_of(&output), "04:34:00 INFO  foo\n");
}

#[test]
fn test_raw_non_json() {
    let output = run_on("not json at all\n", &[]);
    assert_eq!(stdout_of(&output), "not json at all\n");
}

#[test]
fn test_regexp_on_raw_line() {
    let output = run_on("Hello Moto", &["-rHello", "-rMoto", "--color", "always"]);
    assert_eq!(
        stdout_of(&output),
        "\x1b[33mHello\x1b[0m \x1b[35mMoto\x1b[0m\n"
    );
}

#[test]
fn test_color_never_has_no_escapes() {
    let output = run_on(r#"{"level":"error","msg":"boom"}"#, &["--color", "never"]);
    assert!(!stdout_of(&output).contains('\x1b'));
}

#[test]
fn test_level_filter_keeps_order() {
    let input = [
        r#"{"level":"info","msg":"one"}"#,
        r#"{"level":"error","msg":"two"}"#,
        "plain",
        r#"{"level":"warn","msg":"three"}"#,
    ]
    .join("\n");
    let output = run_on(&input, &["--min-level", "warn"]);
    assert_eq!(stdout_of(&output), "ERROR two\nWARN  three\n");
}

#[test]
fn test_kail_prefix() {
    let line = r#"ns/pod[container]: {"level":"INFO","msg":"Hello Moto"}"#;
    assert_eq!(stdout_of(&run_on(line, &[])), "INFO  ns/pod[container] Hello Moto\n");
    assert_eq!(stdout_of(&run_on(line, &["--kail-no-prefix"])), "INFO  Hello Moto\n");
}

#[test]
fn test_reads_stdin_by_default() {
    let mut child = snazy()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"{\"level\":\"debug\",\"msg\":\"piped\"}\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(stdout_of(&output), "DEBUG piped\n");
}

#[test]
fn test_shell_completion() {
    for shell in ["bash", "zsh", "fish"] {
        let output = snazy().args(["--shell-completion", shell]).output().unwrap();
        assert!(!stdout_of(&output).is_empty(), "{shell}");
    }
}

#[test]
fn test_unsupported_shell_fails() {
    let output = snazy()
        .args(["--shell-completion", "powershell"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported shell"));
}

#[test]
fn test_missing_input_file_fails() {
    let output = snazy().arg("/nonexistent/snazy-input.log").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_stress_one_percent_malformed() {
    let mut input = String::new();
    for i in 0..100_000 {
        if i % 100 == 0 {
            input.push_str("{this is not json\n");
        } else {
            input.push_str(&format!(
                "{{\"level\":\"info\",\"ts\":{},\"msg\":\"line {}\",\"n\":{}}}\n",
                1_700_000_000 + i,
                i,
                i
            ));
        }
    }

    let output = run_on(&input, &[]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert_eq!(stdout.lines().count(), 100_000);
    assert_eq!(
        stdout.lines().filter(|l| *l == "{this is not json").count(),
        1_000
    );
}

#[test]
fn test_broken_pipe_exits_non_zero() {
    let line = "{\"level\":\"info\",\"msg\":\"filler filler filler filler filler\"}\n";
    let file = input_file(&line.repeat(200_000));

    let mut child = snazy()
        .arg(file.path())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stdout = child.stdout.take().unwrap();
    let mut head = [0u8; 64];
    stdout.read_exact(&mut head).unwrap();
    drop(stdout);

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(2));
}

#[test]
fn test_control_characters_keep_one_line_per_record() {
    let output = run_on(
        "{\"level\":\"info\",\"msg\":\"first\\nERROR forged line\"}\n",
        &["--color", "never"],
    );
    assert_eq!(stdout_of(&output), "INFO  first\\nERROR forged line\n");
}

#[cfg(unix)]
#[test]
fn test_read_error_flushes_then_exits_two() {
    let file = input_file("{\"level\":\"info\",\"msg\":\"a\"}\n");
    let dir = TempDir::new().unwrap();

    // Opening a directory succeeds, reading it does not
    let output = snazy()
        .args(["--color", "never"])
        .arg(file.path())
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "INFO  a\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read input"));
}

#[cfg(unix)]
#[test]
fn test_interrupt_exits_zero_while_stdin_is_open() {
    let mut child = snazy()
        .args(["--color", "never"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    stdin
        .write_all(b"{\"level\":\"info\",\"msg\":\"hello\"}\n")
        .unwrap();
    stdin.flush().unwrap();

    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut first = String::new();
    stdout.read_line(&mut first).unwrap();
    assert_eq!(first, "INFO  hello\n");

    // Let the signal handler get installed behind the first line
    std::thread::sleep(Duration::from_millis(200));
    let killed = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("snazy still running after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert_eq!(status.code(), Some(0));
    drop(stdin);
}
