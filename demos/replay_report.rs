//! Replay a short recorded session and print its assessment report

use motor_flux::{session_to_report, EngineConfig};

fn main() {
    let session = r#"{"type":"tick","angular_rate":{"x":12.0,"y":-8.5,"z":4.0},"force":62.0}
{"type":"tap","t_ms":40}
{"type":"tick","angular_rate":{"x":14.5,"y":-9.0,"z":3.5},"force":64.5}
{"type":"tap","t_ms":190}
{"type":"tap","t_ms":350}
{"type":"tick","angular_rate":{"x":18.0,"y":-11.0,"z":6.0},"force":66.0}
{"type":"drop"}
{"type":"tap","t_ms":520}
{"type":"tick","force":71.0}
"#;

    match session_to_report(EngineConfig::default(), session, "Demo Subject") {
        Ok(report) => println!("{report}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}
