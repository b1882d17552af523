use clap::{Parser, Subcommand};
use pathline_core::SteeringParams;
use pathline_eye::RowSegmenter;
use pathline_bench::SyntheticTrack;
use pathline_pilot::{FrameTiming, LinePipeline, MotorMixer};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pathline-bench")]
#[command(about = "Line pipeline throughput on synthetic camera frames")]
struct Cli {
    #[command(subcommand)]
    command: Option<BenchCommand>,

    /// Steering configuration file (JSON, TOML or YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum BenchCommand {
    /// Drive a simulated course with periodic forks
    Track {
        #[arg(long, default_value = "600")]
        frames: usize,

        #[arg(long, default_value = "640")]
        width: usize,

        #[arg(long, default_value = "480")]
        height: usize,

        /// Simulated camera rate
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Frames between forks
        #[arg(long, default_value = "150")]
        fork_every: usize,

        /// Frames a fork stays in view
        #[arg(long, default_value = "20")]
        fork_frames: usize,

        /// Per-sample noise amplitude
        #[arg(long, default_value = "0")]
        noise: u8,

        /// Line width as a fraction of frame width
        #[arg(long, default_value = "0.08")]
        line_width: f64,

        #[arg(long, default_value = "1")]
        seed: u64,
    },
    /// Segment single rows of increasing width
    Rows {
        #[arg(long, default_value = "100000")]
        iterations: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let params = match &cli.config {
        Some(path) => SteeringParams::from_file(path)?,
        None => SteeringParams::default(),
    };

    match cli.command {
        Some(BenchCommand::Track {
            frames,
            width,
            height,
            fps,
            fork_every,
            fork_frames,
            noise,
            line_width,
            seed,
        }) => run_track(
            params,
            TrackRun {
                frames,
                width,
                height,
                fps,
                fork_every,
                fork_frames,
                noise,
                line_width,
                seed,
            },
        ),
        Some(BenchCommand::Rows { iterations }) => run_rows(&params, iterations),
        None => run_track(params, TrackRun::default()),
    }
}

struct TrackRun {
    frames: usize,
    width: usize,
    height: usize,
    fps: u32,
    fork_every: usize,
    fork_frames: usize,
    noise: u8,
    line_width: f64,
    seed: u64,
}

impl Default for TrackRun {
    fn default() -> Self {
        Self {
            frames: 600,
            width: 640,
            height: 480,
            fps: 30,
            fork_every: 150,
            fork_frames: 20,
            noise: 0,
            line_width: 0.08,
            seed: 1,
        }
    }
}

fn run_track(params: SteeringParams, run: TrackRun) -> anyhow::Result<()> {
    println!("Track Benchmark");
    println!("---------------");
    println!(
        "  {} frames of {}x{} @ {} fps, fork every {} frames",
        run.frames, run.width, run.height, run.fps, run.fork_every
    );

    let mut pipeline = LinePipeline::new(params, run.width, run.height)?;
    let mut track = SyntheticTrack::new(run.width, run.height, run.seed)?
        .with_noise(run.noise)
        .with_line_width(run.line_width);
    let mut timing = FrameTiming::new();
    let mixer = MotorMixer::default();

    let period = Duration::from_secs_f64(1.0 / f64::from(run.fps.max(1)));
    let start = Instant::now();

    let mut busy = Duration::ZERO;
    let mut slowest = Duration::ZERO;
    let mut forks = 0usize;
    let mut lost = 0usize;
    let mut steering_sum = 0.0;
    let mut wall_max: f64 = 0.0;
    let mut last_power = mixer.mix(0.0, 0.0);

    for i in 0..run.frames {
        let phase = i as f64 / run.frames.max(1) as f64 * std::f64::consts::TAU;
        let drift = 0.4 * phase.sin();
        let in_fork = run.fork_every > 0 && i % run.fork_every < run.fork_frames && i >= run.fork_every;
        let lines = if in_fork {
            vec![drift - 0.3, drift + 0.3]
        } else {
            vec![drift]
        };
        let wall = (i as f64 / run.frames.max(1) as f64) * 0.5;

        let frame = track.render(&lines, wall);
        let now = start + period * i as u32;

        let tick_start = Instant::now();
        let out = pipeline.process_at(&frame, &mut timing, now)?;
        let elapsed = tick_start.elapsed();

        busy += elapsed;
        slowest = slowest.max(elapsed);
        forks += usize::from(out.fork_event);
        lost += usize::from(out.line.is_lost());
        steering_sum += out.steering.abs();
        wall_max = wall_max.max(out.wall_closeness);
        last_power = mixer.mix(out.steering, 0.5);
    }

    let ticks = run.frames.max(1) as f64;
    info!("Processed {} frames", timing.frames());
    println!("  Mean tick: {:?}", busy / run.frames.max(1) as u32);
    println!("  Slowest tick: {:?}", slowest);
    println!("  Throughput: {:.0} ticks/sec", ticks / busy.as_secs_f64().max(f64::EPSILON));
    println!("  Fork events: {}", forks);
    println!("  Frames without a line: {}", lost);
    println!("  Mean |steering|: {:.4}", steering_sum / ticks);
    println!("  Peak wall closeness: {:.3}", wall_max);
    println!("  Final motor power: left {} right {}", last_power.left, last_power.right);
    println!();
    Ok(())
}

fn run_rows(params: &SteeringParams, iterations: usize) -> anyhow::Result<()> {
    println!("Row Segmentation Benchmark");
    println!("--------------------------");

    let segmenter = RowSegmenter::new(params.threshold, params.min_width);
    for width in [160usize, 320, 640, 1280] {
        let mut row = vec![200u8; width];
        for (i, sample) in row.iter_mut().enumerate() {
            if (i / 16) % 3 == 0 {
                *sample = 30;
            }
        }

        let start = Instant::now();
        let mut segments = 0usize;
        for _ in 0..iterations {
            segments += segmenter.segment(&row).len();
        }
        let duration = start.elapsed();

        let throughput = iterations as f64 / duration.as_secs_f64().max(f64::EPSILON);
        println!(
            "  Width {}: {:?} ({:.0} rows/sec, {} segments per row)",
            width,
            duration,
            throughput,
            segments / iterations.max(1)
        );
    }

    println!();
    Ok(())
}
