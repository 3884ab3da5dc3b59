mod progress_window;

use structopt::StructOpt;

use solid_synthesis::{Error, HeaderPolicy, Session, Termination, VolumeFile};
use std::path::PathBuf;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case")]
struct Generate {
    /// Path to the example image the volume's cross-sections should look like
    #[structopt(parse(from_os_str))]
    exemplar: PathBuf,
    /// The path to save the generated `.vol` file to. You may use `-` for stdout.
    #[structopt(long = "out", short, parse(from_os_str))]
    output_path: PathBuf,
    /// Edge length of the generated cube
    #[structopt(long, default_value = "64")]
    size: u32,
    /// Edge length of the square neighborhoods compared between the volume
    /// and the exemplar, must be odd. Larger windows capture larger structures.
    #[structopt(long, default_value = "3")]
    window: u32,
    /// The number of passes over the whole volume
    #[structopt(long, default_value = "2")]
    iterations: u32,
    /// A seed value for the initial noise. The same seed always produces the
    /// same volume, regardless of the number of threads
    #[structopt(long, default_value = "0")]
    seed: u64,
    /// The maximum number of worker threads that can be active at any one time
    /// while synthesizing. Defaults to the logical core count.
    #[structopt(short = "t", long = "threads")]
    max_threads: Option<usize>,
    /// The texture name stored in the `.vol` header. Defaults to the output
    /// file name.
    #[structopt(long)]
    name: Option<String>,
    /// Flags the saved volume as not tiling
    #[structopt(long)]
    no_wrap: bool,
    /// Don't show progress bars
    #[structopt(long)]
    no_progress: bool,
}

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case")]
struct Inspect {
    /// Path to a `.vol` file
    #[structopt(parse(from_os_str))]
    path: PathBuf,
    /// Fail on any unexpected header field instead of warning about it
    #[structopt(long)]
    strict: bool,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Generates a new solid texture from an example image
    #[structopt(name = "generate")]
    Generate(Generate),
    /// Prints the header of a `.vol` file
    #[structopt(name = "inspect")]
    Inspect(Inspect),
}

#[derive(StructOpt)]
#[structopt(
    name = "solid-synthesis",
    about = "Synthesizes solid textures based on example images",
    rename_all = "kebab-case"
)]
struct Opt {
    /// The log level, or a per-module filter such as
    /// `warn,solid_synthesis=debug`. `RUST_LOG` takes precedence when set.
    #[structopt(long, default_value = "warn")]
    log_level: String,
    #[structopt(subcommand)]
    cmd: Subcommand,
}

fn main() {
    if let Err(e) = real_main() {
        if atty::is(atty::Stream::Stderr) {
            eprintln!("\x1b[31merror\x1b[0m: {}", e);
        } else {
            eprintln!("error: {}", e);
        }

        std::process::exit(1);
    }
}

fn real_main() -> Result<(), Error> {
    let args = Opt::from_args();

    let _logger = match flexi_logger::Logger::try_with_env_or_str(&args.log_level)
        .and_then(|logger| logger.log_to_stderr().start())
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            None
        }
    };

    match args.cmd {
        Subcommand::Generate(gen) => generate(gen),
        Subcommand::Inspect(insp) => inspect(insp),
    }
}

fn generate(args: Generate) -> Result<(), Error> {
    let to_stdout = args.output_path.to_str() == Some("-");

    let name = match args.name {
        Some(name) => name,
        None if to_stdout => "texture".to_owned(),
        None => args
            .output_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "texture".to_owned()),
    };

    let mut sb = Session::builder()
        .exemplar(&args.exemplar)
        .volume_size(args.size)
        .window_size(args.window)
        .iterations(args.iterations)
        .seed(args.seed)
        .texture_name(name)
        .wrap(!args.no_wrap);

    if let Some(mt) = args.max_threads {
        sb = sb.max_thread_count(mt);
    }

    let session = sb.build()?;

    let progress: Option<Box<dyn solid_synthesis::GeneratorProgress>> = if !args.no_progress {
        Some(Box::new(progress_window::ProgressWindow::new()))
    } else {
        None
    };

    let generated = session.run(progress)?;

    if let Termination::Cancelled { completed_passes } = generated.termination() {
        log::warn!("synthesis stopped after {} passes", completed_passes);
    }

    if let Some(energy) = generated.energies().last() {
        log::info!("final energy {}", energy);
    }

    if to_stdout {
        let out = std::io::stdout();
        let mut out = out.lock();
        generated.write(&mut out)?;
    } else {
        generated.save(&args.output_path)?;
        log::info!("saved volume to {}", args.output_path.display());
    }

    Ok(())
}

fn inspect(args: Inspect) -> Result<(), Error> {
    let policy = if args.strict {
        HeaderPolicy::Strict
    } else {
        HeaderPolicy::Lenient
    };

    let file = VolumeFile::open(&args.path, policy)?;
    let header = &file.header;

    println!("texture name:      {}", header.texture_name);
    println!("version:           {}", header.version);
    println!("wrap:              {}", header.wrap);
    println!("volume size:       {0}x{0}x{0}", header.volume_size);
    println!("channels:          {}", header.num_channels);
    println!("bytes per channel: {}", header.bytes_per_channel);
    println!("data bytes:        {}", file.data.len());

    if let Ok(volume) = file.to_volume() {
        let voxels = volume.as_slice();
        let mut sum = [0u64; 3];
        for voxel in voxels {
            for (s, c) in sum.iter_mut().zip(voxel.to_array().iter()) {
                *s += u64::from(*c);
            }
        }

        let count = voxels.len() as u64;
        println!(
            "mean color:        ({}, {}, {})",
            sum[0] / count,
            sum[1] / count,
            sum[2] / count
        );
    }

    Ok(())
}
