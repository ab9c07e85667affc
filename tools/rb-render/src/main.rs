//! resobank renderer — feeds the filter bank its own noise and renders the
//! result to a WAV file or plays it live.
//!
//! Usage:
//!   rb-render [--seconds N] [--rate HZ] [--bank N] [--filter two|one|bpre]
//!             [--noise brown|pink|white] [--q 0..4095] [--wav out.wav | --play]

use rb_audio::{AudioOutput, CpalOutput, Frame, OutputMode, Pipeline};
use rb_dsp::{BlockParams, FilterBank, FilterType, NoiseColor, ScaleSet, NUM_CHANNELS};
use std::{env, fs};

mod wav;

struct Options {
    seconds: f32,
    rate: f32,
    bank: usize,
    filter: FilterType,
    noise: NoiseColor,
    q: f32,
    wav: Option<String>,
    play: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = parse_args(&args);

    let catalog = ScaleSet::default();
    let bank_name = catalog
        .presets
        .get(opts.bank)
        .map(|p| p.name.as_str().to_owned())
        .unwrap_or_else(|| "<clamped>".to_owned());

    println!("Bank:    {} ({})", opts.bank, bank_name);
    println!("Filter:  {:?}", opts.filter);
    println!("Noise:   {:?}", opts.noise);
    println!("Q:       {}", opts.q);
    println!("Length:  {} s", opts.seconds);
    println!();

    let mut bank = FilterBank::new(catalog);
    bank.request_filter_type(opts.filter);
    bank.change_bank(opts.bank, &[false; NUM_CHANNELS]);

    let mut params = BlockParams::default();
    params.q = [opts.q; NUM_CHANNELS];

    if opts.play {
        play(&mut bank, &params, &opts);
    } else {
        render(&mut bank, &params, &opts);
    }
}

fn parse_args(args: &[String]) -> Options {
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!(
            "Usage: rb-render [--seconds N] [--rate HZ] [--bank N] \
             [--filter two|one|bpre] [--noise brown|pink|white] \
             [--q 0..4095] [--wav out.wav | --play]"
        );
        std::process::exit(0);
    }

    let value = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };

    let filter = match value("--filter").as_deref() {
        None | Some("two") => FilterType::TwoPass,
        Some("one") => FilterType::OnePass,
        Some("bpre") => FilterType::Bpre,
        Some(other) => {
            eprintln!("Unknown filter type '{}'", other);
            std::process::exit(1);
        }
    };

    let noise = match value("--noise").as_deref() {
        Some("brown") => NoiseColor::Brown,
        Some("white") => NoiseColor::White,
        None | Some(_) => NoiseColor::Pink,
    };

    Options {
        seconds: value("--seconds").and_then(|v| v.parse().ok()).unwrap_or(5.0),
        rate: value("--rate").and_then(|v| v.parse().ok()).unwrap_or(48_000.0),
        bank: value("--bank").and_then(|v| v.parse().ok()).unwrap_or(0),
        filter,
        noise,
        q: value("--q").and_then(|v| v.parse().ok()).unwrap_or(2048.0),
        wav: value("--wav"),
        play: args.iter().any(|a| a == "--play"),
    }
}

fn render(bank: &mut FilterBank, params: &BlockParams, opts: &Options) {
    let path = opts.wav.clone().unwrap_or_else(|| "resobank.wav".to_owned());
    println!("Rendering to {} at {} Hz...", path, opts.rate);

    let mut pipeline = Pipeline::new(opts.rate);
    pipeline.set_output_mode(OutputMode::Stereo);
    pipeline.set_noise_color(opts.noise);

    let total = (opts.seconds * opts.rate) as usize;
    let mut frames = Vec::with_capacity(total);
    let mut out = [0.0f32; 2];
    for _ in 0..total {
        pipeline.process(bank, params, &[], &mut out);
        frames.push(Frame {
            left: out[0],
            right: out[1],
        });
    }

    let data = wav::frames_to_wav(&frames, opts.rate as u32);
    fs::write(&path, &data).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        std::process::exit(1);
    });
    println!("Wrote {} bytes.", data.len());
}

fn play(bank: &mut FilterBank, params: &BlockParams, opts: &Options) {
    let (mut output, consumer) = CpalOutput::new().unwrap_or_else(|e| {
        eprintln!("Audio init failed: {}", e);
        std::process::exit(1);
    });

    let rate = output.sample_rate() as f32;
    let mut pipeline = Pipeline::new(rate);
    pipeline.set_output_mode(OutputMode::Stereo);
    pipeline.set_noise_color(opts.noise);

    if let Err(e) = output.build_stream(consumer) {
        eprintln!("Stream failed: {}", e);
        std::process::exit(1);
    }
    let _ = output.start();
    println!("Playing at {} Hz...", rate);

    let total = (opts.seconds * rate) as usize;
    let mut out = [0.0f32; 2];
    for _ in 0..total {
        pipeline.process(bank, params, &[], &mut out);
        output.write_spin(Frame {
            left: out[0],
            right: out[1],
        });
    }

    let _ = output.stop();
    println!("Done.");
}
