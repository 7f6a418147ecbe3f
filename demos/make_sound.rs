use hound::{SampleFormat, WavSpec, WavWriter};
use mlsa::{Track, VoiceFile, VoiceModel, synthesize};

const SHIFT: f32 = 0.005;

/// Rough mel-cepstrum of an open vowel.
const VOWEL: [f32; 12] = [
    5.5, 0.9, -0.35, 0.3, -0.1, 0.12, -0.05, 0.04, -0.02, 0.01, 0.0, 0.0,
];

fn voice() -> VoiceModel {
    match std::env::args().nth(1) {
        Some(path) => {
            let bytes = std::fs::read(&path).unwrap_or_else(|error| {
                println!("Error: {path}: {error}");
                std::process::exit(1);
            });
            match VoiceFile::load(&bytes[..]) {
                Ok(file) => file.model,
                Err(error) => {
                    println!("Error: {path}: {error}");
                    std::process::exit(1);
                }
            }
        }
        None => VoiceModel {
            name: "demo".to_string(),
            sample_rate: 16000,
            frame_advance: SHIFT,
            mlsa_alpha: 0.42,
            mlsa_beta: 0.1,
            ..VoiceModel::default()
        },
    }
}

/// Half a second of a falling vowel between two breaths.
fn params() -> Track {
    let frames = (0..120).map(|i| {
        let mut frame = vec![0.0];
        frame.extend_from_slice(&VOWEL);
        if (10..110).contains(&i) {
            frame[0] = 140.0 - (i - 10) as f32 * 0.3;
        } else {
            frame[1] = 2.0;
        }
        frame
    });
    Track::with_shift(VOWEL.len() + 1, SHIFT, frames).unwrap()
}

fn main() {
    env_logger::init();
    let voice = voice();
    let wave = match synthesize(&voice, &params(), None, None) {
        Ok(synthesis) => synthesis.into_wave(),
        Err(error) => {
            println!("Error: {error}");
            std::process::exit(1);
        }
    };
    let mut wav = WavWriter::create(
        "out.wav",
        WavSpec {
            channels: wave.num_channels(),
            sample_rate: wave.sample_rate(),
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    )
    .unwrap();
    for &sample in wave.samples() {
        wav.write_sample(sample).unwrap();
    }
    wav.finalize().unwrap();
    println!(
        "Wrote {} samples ({:.2} s) to out.wav",
        wave.num_samples(),
        wave.duration_secs()
    );
}
