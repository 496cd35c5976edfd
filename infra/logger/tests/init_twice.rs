use cryptix_logger::{LogFormat, Logger, LoggerError};

#[test]
fn second_logger_is_refused_and_first_keeps_working() {
    let first = Logger::builder()
        .name("cryptix-first")
        .format(LogFormat::Json)
        .env_filter("cryptix_auth=debug")
        .init()
        .expect("no subscriber installed yet");
    first.register("cryptix_render").expect("valid target");

    let second = Logger::builder().name("cryptix-second").format(LogFormat::NoColor).init();
    let Err(err) = second else {
        panic!("a process only gets one global subscriber");
    };
    assert!(matches!(err, LoggerError::Subscriber { .. }), "{err}");
    assert!(err.to_string().starts_with("Tracing subscriber error"), "{err}");

    first.set_log_level("cryptix_render", "trace").expect("first logger still reloads");
    cryptix_logger::init_test();
}
