#![cfg(unix)]

use cryptix_io::{CountingReader, IoError, LoggedStream, StdioConn};
use std::io::{BufRead, BufReader, Read, Write};

#[test]
fn cat_echoes_what_it_is_fed() {
    cryptix_logger::init_test();

    let mut conn = StdioConn::spawn("cat", std::iter::empty::<&str>()).expect("cat is available");
    conn.write_all(b"hello stdio\n").unwrap();

    let mut line = String::new();
    BufReader::new(&mut conn).read_line(&mut line).unwrap();
    assert_eq!(line, "hello stdio\n");

    let status = conn.wait().unwrap();
    assert!(status.success());
}

#[test]
fn closing_stdin_ends_the_child() {
    cryptix_logger::init_test();

    let mut conn = StdioConn::spawn("cat", std::iter::empty::<&str>()).unwrap();
    conn.close();

    assert!(conn.write(b"late").is_err());
    assert!(conn.read(&mut [0u8; 8]).is_err());
    assert!(conn.wait().unwrap().success());
}

#[test]
fn stderr_output_does_not_block_stdout() {
    cryptix_logger::init_test();

    let script = "for i in 1 2 3; do echo noise-$i >&2; done; echo done";
    let mut conn = StdioConn::spawn("sh", ["-c", script]).unwrap();

    let mut out = String::new();
    let mut logged = LoggedStream::wrap(&mut conn);
    logged.read_to_string(&mut out).unwrap();
    assert_eq!(out, "done\n");

    let mut counted = CountingReader::new(out.as_bytes());
    std::io::copy(&mut counted, &mut std::io::sink()).unwrap();
    assert_eq!(counted.n(), 5);

    assert!(conn.wait().unwrap().success());
}

#[test]
fn missing_program_is_a_process_error() {
    let err = StdioConn::spawn("/definitely/not/a/program", ["x"]).unwrap_err();
    assert!(matches!(err, IoError::Process { .. }), "{err}");
    assert!(err.to_string().contains("/definitely/not/a/program"));
}
