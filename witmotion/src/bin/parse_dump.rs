//! Decode a raw WitMotion serial capture into CSV.
//!
//! Each dataset between frame markers becomes one row. Datasets that fail
//! to decode are written as `dropped` rows with the reason and a hex dump.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use witmotion::{DatasetDecoder, DecodeOptions, FrameSplitter, MeasurementSet, PressureUnit};

#[derive(Parser, Debug)]
#[command(name = "parse_dump")]
#[command(about = "Decode a raw WitMotion serial capture into CSV")]
struct Args {
    /// Raw byte capture from the sensor
    dump_file: PathBuf,

    /// Output CSV path
    output_csv: PathBuf,

    /// Drop datasets with any failing sub-record checksum
    #[arg(long)]
    enforce_checksum: bool,

    /// Heading offset in degrees
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    heading_offset: f64,
}

const HEADER: &str = "type,datetime,accel_x,accel_y,accel_z,accel_temp_k,\
gyro_x_dps,gyro_y_dps,gyro_z_dps,gyro_temp_k,roll_rad,pitch_rad,yaw_rad,heading_rad,\
pressure_pa,baro_alt_m,latitude,longitude,gps_alt_m,course_deg,speed_kmh,\
q0,q1,q2,q3,satellites,pdop,hdop,vdop,issues,dropped";

fn opt<T>(value: Option<T>, f: impl Fn(T) -> String) -> String {
    value.map(f).unwrap_or_default()
}

fn data_row(set: &MeasurementSet) -> String {
    let f6 = |v: f64| format!("{v:.6}");
    let datetime = set
        .time
        .and_then(|t| t.to_iso8601())
        .unwrap_or_default();

    let fields = [
        "data".to_string(),
        datetime,
        opt(set.acceleration, |a| f6(a.x)),
        opt(set.acceleration, |a| f6(a.y)),
        opt(set.acceleration, |a| f6(a.z)),
        opt(set.acceleration, |a| format!("{:.2}", a.temperature)),
        opt(set.angular_velocity, |w| f6(w.x)),
        opt(set.angular_velocity, |w| f6(w.y)),
        opt(set.angular_velocity, |w| f6(w.z)),
        opt(set.angular_velocity, |w| format!("{:.2}", w.temperature)),
        opt(set.attitude, |a| f6(a.roll)),
        opt(set.attitude, |a| f6(a.pitch)),
        opt(set.attitude, |a| f6(a.yaw)),
        opt(set.attitude, |a| f6(a.heading)),
        opt(set.atmosphere, |a| format!("{:.0}", a.pressure)),
        opt(set.atmosphere, |a| format!("{:.2}", a.altitude)),
        opt(set.gps_position, |p| format!("{:.7}", p.latitude)),
        opt(set.gps_position, |p| format!("{:.7}", p.longitude)),
        opt(set.gps_speed, |s| format!("{:.1}", s.altitude)),
        opt(set.gps_speed, |s| format!("{:.2}", s.course)),
        opt(set.gps_speed, |s| format!("{:.3}", s.speed_kmh)),
        opt(set.quaternion, |q| f6(q.q0)),
        opt(set.quaternion, |q| f6(q.q1)),
        opt(set.quaternion, |q| f6(q.q2)),
        opt(set.quaternion, |q| f6(q.q3)),
        opt(set.satellite_accuracy, |s| s.satellites.to_string()),
        opt(set.satellite_accuracy, |s| f6(s.pdop)),
        opt(set.satellite_accuracy, |s| f6(s.hdop)),
        opt(set.satellite_accuracy, |s| f6(s.vdop)),
        set.issues
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("; "),
        String::new(),
    ];
    fields.join(",")
}

fn dropped_row(reason: &str, bytes: &[u8]) -> String {
    let hex: String = bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    let reason = reason.replace(',', ";");
    format!("dropped{}{reason},{hex}", ",".repeat(29))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut data = Vec::new();
    File::open(&args.dump_file)
        .and_then(|mut f| f.read_to_end(&mut data))
        .with_context(|| format!("Failed to read {}", args.dump_file.display()))?;
    println!("Read {} bytes from {}", data.len(), args.dump_file.display());

    let decoder = DatasetDecoder::new(DecodeOptions {
        enforce_checksum: args.enforce_checksum,
        validate_markers: true,
        pressure_unit: PressureUnit::Pascal,
    })
    .with_heading_offset(args.heading_offset);

    let mut splitter = FrameSplitter::new();
    let mut frames = splitter.feed(&data);
    frames.extend(splitter.finish());

    let file = File::create(&args.output_csv)
        .with_context(|| format!("Failed to create {}", args.output_csv.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{HEADER}")?;

    let mut decoded = 0usize;
    let mut dropped = 0usize;
    for frame in &frames {
        match decoder.decode(frame) {
            Ok(set) => {
                decoded += 1;
                writeln!(out, "{}", data_row(&set))?;
            }
            Err(e) => {
                dropped += 1;
                writeln!(out, "{}", dropped_row(&e.to_string(), frame))?;
            }
        }
    }
    out.flush()?;

    println!(
        "Decoded {decoded} datasets, dropped {dropped}, {} bytes before first marker",
        splitter.discarded()
    );
    println!("Wrote {}", args.output_csv.display());
    Ok(())
}
