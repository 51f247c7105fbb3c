use json_logger::{emit_record, Attribute, Emitter, Extras, Level, Options};

fn main() {
    let emitter = Emitter::new(std::io::stdout(), Options::default(), Extras::default())
        .with_attributes(vec![Attribute::string("app", "json_logger-demo")]);

    emit_record!(emitter, Level::Info, "starting up").unwrap();

    let request = emitter.with_group("request");
    emit_record!(request, Level::Info, "handled",
        Attribute::string("method", "GET"),
        Attribute::string("path", "/health"),
        Attribute::int("status", 200),
    )
    .unwrap();

    // No attributes at call time: the derived group is elided entirely.
    emit_record!(request, Level::Warn, "slow response").unwrap();
}
