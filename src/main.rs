//! arena2 CLI - Command-line tool for legacy ARENA2 game assets.
//!
//! This is the main entry point for the arena2 command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use tracing::Level;

use arena2::mesh::obj::write_obj;
use arena2::pak::{PAK_HEIGHT, PAK_WIDTH};
use arena2::prelude::*;

/// arena2 - legacy ARENA2 game asset tool
#[derive(Parser)]
#[command(name = "arena2")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How archives are held while a command runs.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum UsageArg {
    Disk,
    #[default]
    Mapped,
    Memory,
}

impl From<UsageArg> for Usage {
    fn from(value: UsageArg) -> Self {
        match value {
            UsageArg::Disk => Usage::Disk,
            UsageArg::Mapped => Usage::Mapped,
            UsageArg::Memory => Usage::Memory,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MeshFormat {
    Obj,
    Json,
}

impl MeshFormat {
    fn extension(self) -> &'static str {
        match self {
            MeshFormat::Obj => "obj",
            MeshFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List records of a BSA archive
    BsaList {
        /// Path to the BSA file
        #[arg(short, long, env = "INPUT_BSA")]
        bsa: PathBuf,

        /// Filter pattern (regex, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,

        #[arg(long, value_enum, default_value_t)]
        usage: UsageArg,
    },

    /// Extract records from a BSA archive
    BsaExtract {
        /// Path to the BSA file
        #[arg(short, long, env = "INPUT_BSA")]
        bsa: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (regex, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(long, value_enum, default_value_t)]
        usage: UsageArg,
    },

    /// Replace the contents of one record in place
    BsaReplace {
        /// Path to the BSA file
        #[arg(short, long, env = "INPUT_BSA")]
        bsa: PathBuf,

        /// Record name or index
        #[arg(short, long)]
        record: String,

        /// File holding the new contents
        #[arg(short, long)]
        input: PathBuf,

        /// Hold the archive in memory and write it back on close
        #[arg(long)]
        in_memory: bool,
    },

    /// Build a BSA archive from the files of a directory
    BsaPack {
        /// Input directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output BSA file
        #[arg(short, long)]
        output: PathBuf,

        /// Write a number directory; file stems must be numeric ids
        #[arg(long)]
        numbered: bool,
    },

    /// Export one mesh from ARCH3D.BSA
    MeshExport {
        /// Path to ARCH3D.BSA
        #[arg(short, long, env = "INPUT_BSA")]
        bsa: PathBuf,

        /// Object id
        #[arg(long)]
        id: u32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value = "obj")]
        format: MeshFormat,

        /// Fail on the first bad face instead of skipping it
        #[arg(long)]
        strict: bool,

        #[arg(long, value_enum, default_value_t)]
        usage: UsageArg,
    },

    /// Export every mesh of ARCH3D.BSA
    MeshBatch {
        /// Path to ARCH3D.BSA
        #[arg(short, long, env = "INPUT_BSA")]
        bsa: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        #[arg(long, value_enum, default_value = "obj")]
        format: MeshFormat,

        /// Filter pattern (regex, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(long, value_enum, default_value_t)]
        usage: UsageArg,
    },

    /// Convert a PAK raster to a greyscale PNG of palette indices
    PakDecode {
        /// Input PAK file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert a greyscale PNG of palette indices to a PAK raster
    PakEncode {
        /// Input PNG file (1001x500)
        #[arg(short, long)]
        input: PathBuf,

        /// Output PAK file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the block grid of a dungeon block section
    DungeonLayout {
        /// File holding the raw dungeon block section
        #[arg(short, long)]
        input: PathBuf,

        /// Force the starting block to this descriptor index
        #[arg(long)]
        start: Option<usize>,

        /// Print JSON instead of an ASCII map
        #[arg(long)]
        json: bool,
    },

    /// Extract sounds from DAGGER.SND as WAV files
    SoundExtract {
        /// Path to DAGGER.SND
        #[arg(short, long, env = "INPUT_SND")]
        snd: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Only extract this record index
        #[arg(long)]
        index: Option<usize>,

        #[arg(long, value_enum, default_value_t)]
        usage: UsageArg,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::BsaList { bsa, filter, detailed, usage } => {
            cmd_bsa_list(&bsa, filter.as_deref(), detailed, usage)?;
        }
        Commands::BsaExtract { bsa, output, filter, usage } => {
            cmd_bsa_extract(&bsa, &output, filter.as_deref(), usage)?;
        }
        Commands::BsaReplace { bsa, record, input, in_memory } => {
            cmd_bsa_replace(&bsa, &record, &input, in_memory)?;
        }
        Commands::BsaPack { input, output, numbered } => {
            cmd_bsa_pack(&input, &output, numbered)?;
        }
        Commands::MeshExport { bsa, id, output, format, strict, usage } => {
            cmd_mesh_export(&bsa, id, &output, format, strict, usage)?;
        }
        Commands::MeshBatch { bsa, output, format, filter, usage } => {
            cmd_mesh_batch(&bsa, &output, format, filter.as_deref(), usage)?;
        }
        Commands::PakDecode { input, output } => {
            cmd_pak_decode(&input, &output)?;
        }
        Commands::PakEncode { input, output } => {
            cmd_pak_encode(&input, &output)?;
        }
        Commands::DungeonLayout { input, start, json } => {
            cmd_dungeon_layout(&input, start, json)?;
        }
        Commands::SoundExtract { snd, output, index, usage } => {
            cmd_sound_extract(&snd, &output, index, usage)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn open_archive(path: &Path, usage: UsageArg) -> Result<BsaArchive> {
    BsaArchive::load(path, SourceOptions::read_only(usage.into()))
        .with_context(|| format!("Failed to open BSA archive {}", path.display()))
}

fn name_filter(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("Invalid filter pattern: {p}"))
        })
        .transpose()
}

fn matching_records<'a>(archive: &'a BsaArchive, filter: Option<&Regex>) -> Vec<&'a BsaRecord> {
    archive
        .iter()
        .filter(|r| filter.map_or(true, |f| f.is_match(&r.name)))
        .collect()
}

/// Output file for a record, kept inside `output`.
///
/// Names that are empty, contain a path separator, or are `.`/`..` fall back
/// to `record_{index}`.
fn record_output_path(output: &Path, name: &str, index: usize) -> PathBuf {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', ':', '\0']);
    if unsafe_name {
        tracing::warn!(index, name, "record name is not a plain file name");
        output.join(format!("record_{index}"))
    } else {
        output.join(name)
    }
}

fn cmd_bsa_list(bsa: &Path, filter: Option<&str>, detailed: bool, usage: UsageArg) -> Result<()> {
    let archive = open_archive(bsa, usage)?;
    let filter = name_filter(filter)?;

    let records = matching_records(&archive, filter.as_ref());
    for record in &records {
        if detailed {
            println!(
                "{:>6} {:>10} {:>10} {} {}",
                record.index,
                record.offset,
                record.size,
                if record.compressed { "C" } else { " " },
                record.name
            );
        } else {
            println!("{}", record.name);
        }
    }

    println!(
        "\nTotal: {} of {} records ({} directory)",
        records.len(),
        archive.count(),
        archive.directory_type().label()
    );

    Ok(())
}

fn cmd_bsa_extract(bsa: &Path, output: &Path, filter: Option<&str>, usage: UsageArg) -> Result<()> {
    println!("Opening BSA archive: {}", bsa.display());

    let start = Instant::now();
    let archive = open_archive(bsa, usage)?;
    println!("Loaded {} records in {:?}", archive.count(), start.elapsed());

    let filter = name_filter(filter)?;
    let records = matching_records(&archive, filter.as_ref());
    println!("Extracting {} records...", records.len());

    fs::create_dir_all(output)?;
    let pb = progress_bar(records.len())?;

    let start = Instant::now();
    for record in &records {
        let data = archive
            .record_bytes(record.index)
            .with_context(|| format!("Failed to read record {}", record.name))?;
        fs::write(record_output_path(output, &record.name, record.index), data)
            .with_context(|| format!("Failed to write {}", record.name))?;
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!("Extraction completed in {:?}", start.elapsed());

    Ok(())
}

fn cmd_bsa_replace(bsa: &Path, record: &str, input: &Path, in_memory: bool) -> Result<()> {
    let usage = if in_memory { Usage::Memory } else { Usage::Disk };
    let mut archive = BsaArchive::load(bsa, SourceOptions::read_write(usage))
        .with_context(|| format!("Failed to open BSA archive {}", bsa.display()))?;

    let index = archive
        .index_of(record)
        .or_else(|| record.parse().ok().filter(|&i: &usize| i < archive.count()))
        .with_context(|| format!("No record named {record}"))?;

    let data = fs::read(input).context("Failed to read input file")?;
    let old_size = archive.record(index)?.size;

    archive
        .rewrite_record(index, &data)
        .with_context(|| format!("Failed to rewrite record {record}"))?;
    archive.close().context("Failed to write archive")?;

    println!("Replaced record {index} ({old_size} -> {} bytes)", data.len());

    Ok(())
}

fn cmd_bsa_pack(input: &Path, output: &Path, numbered: bool) -> Result<()> {
    let mut files: Vec<PathBuf> = fs::read_dir(input)
        .with_context(|| format!("Failed to read directory {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let directory_type = if numbered { DirectoryType::Number } else { DirectoryType::Name };
    let mut builder = BsaBuilder::new(directory_type);

    for path in &files {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        if numbered {
            let id: u16 = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
                .with_context(|| format!("File name is not a record id: {}", path.display()))?;
            builder.add_numbered(id, data)?;
        } else {
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .with_context(|| format!("File name is not valid text: {}", path.display()))?;
            builder.add_named(name, data)?;
        }
    }

    builder.write_to(output).context("Failed to write archive")?;
    println!("Packed {} records into {}", builder.len(), output.display());

    Ok(())
}

fn write_mesh(mesh: &OutputMesh, name: &str, format: MeshFormat, path: &Path) -> Result<()> {
    match format {
        MeshFormat::Obj => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_obj(mesh, name, std::io::BufWriter::new(file))?;
        }
        MeshFormat::Json => {
            let json = serde_json::to_string_pretty(mesh)?;
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }
    Ok(())
}

fn cmd_mesh_export(
    bsa: &Path,
    id: u32,
    output: &Path,
    format: MeshFormat,
    strict: bool,
    usage: UsageArg,
) -> Result<()> {
    let policy = if strict { FacePolicy::Fail } else { FacePolicy::Skip };
    let mut library = MeshLibrary::new(open_archive(bsa, usage)?).with_policy(policy);

    let mesh = library
        .decode_mesh(id)
        .with_context(|| format!("Failed to decode mesh {id}"))?;
    write_mesh(mesh, &format!("mesh_{id}"), format, output)?;

    println!(
        "Exported mesh {id}: {} vertices, {} triangles, {} submeshes, {} skipped faces",
        mesh.vertices.len(),
        mesh.triangle_count(),
        mesh.submeshes.len(),
        mesh.skipped_faces.len()
    );

    Ok(())
}

fn cmd_mesh_batch(
    bsa: &Path,
    output: &Path,
    format: MeshFormat,
    filter: Option<&str>,
    usage: UsageArg,
) -> Result<()> {
    let start = Instant::now();
    let archive = open_archive(bsa, usage)?;
    let filter = name_filter(filter)?;

    // Record bytes are fetched on this thread; decoding runs in parallel.
    let jobs = matching_records(&archive, filter.as_ref())
        .into_iter()
        .map(|record| -> Result<(String, PathBuf, Vec<u8>)> {
            let path = record_output_path(output, &record.name, record.index)
                .with_extension(format.extension());
            Ok((record.name.clone(), path, archive.record_bytes(record.index)?))
        })
        .collect::<Result<Vec<_>>>()?;

    println!("Decoding {} meshes...", jobs.len());
    fs::create_dir_all(output)?;
    let pb = progress_bar(jobs.len())?;

    let failures: Vec<String> = jobs
        .par_iter()
        .filter_map(|(name, path, bytes)| {
            let result = NativeMesh::parse(bytes)
                .and_then(|native| build_output_mesh(&native, FacePolicy::Skip))
                .map_err(anyhow::Error::from)
                .and_then(|mesh| write_mesh(&mesh, name, format, path));
            pb.inc(1);
            result.err().map(|err| {
                tracing::warn!(record = %name, error = %err, "failed to export mesh");
                name.clone()
            })
        })
        .collect();

    pb.finish_with_message("Done");
    println!(
        "Exported {} meshes in {:?} ({} errors)",
        jobs.len() - failures.len(),
        start.elapsed(),
        failures.len()
    );

    Ok(())
}

fn cmd_pak_decode(input: &Path, output: &Path) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let raster = arena2::pak::decode(&data).context("Failed to decode PAK raster")?;

    let (width, height) = (PAK_WIDTH as u32, PAK_HEIGHT as u32);
    let image = image::GrayImage::from_raw(width, height, raster.into_pixels())
        .context("Raster does not fit image dimensions")?;
    image.save(output).context("Failed to write PNG")?;

    println!("Decoded {}x{} raster to {}", PAK_WIDTH, PAK_HEIGHT, output.display());

    Ok(())
}

fn cmd_pak_encode(input: &Path, output: &Path) -> Result<()> {
    let image = image::open(input).context("Failed to read input image")?.to_luma8();
    if image.dimensions() != (PAK_WIDTH as u32, PAK_HEIGHT as u32) {
        anyhow::bail!(
            "Image is {}x{}, expected {}x{}",
            image.width(),
            image.height(),
            PAK_WIDTH,
            PAK_HEIGHT
        );
    }

    let raster = PakRaster::new(image.into_raw())?;
    let encoded = arena2::pak::encode(&raster);
    fs::write(output, &encoded).context("Failed to write output file")?;

    println!("Encoded raster to {} bytes", encoded.len());

    Ok(())
}

fn cmd_dungeon_layout(input: &Path, start: Option<usize>, json: bool) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let grid = decode_dungeon_layout(&data, start).context("Failed to decode dungeon layout")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&grid)?);
        return Ok(());
    }

    let (origin_x, origin_z) = grid.origin();
    println!("{}x{} blocks, origin ({origin_x}, {origin_z})", grid.width(), grid.height());

    // Highest z first so north is up.
    for gz in (0..grid.height()).rev() {
        let row: String = (0..grid.width())
            .map(|gx| match grid.get(gx, gz) {
                Some(block) if block.is_starting_block => '*',
                Some(block) => block.block_letter().unwrap_or('?'),
                None => '.',
            })
            .collect();
        println!("{row}");
    }

    for (gx, gz, block) in grid.iter() {
        println!(
            "  ({gx}, {gz}) {}{}",
            block.block_name().unwrap_or_else(|| format!("#{}", block.block_number)),
            if block.is_starting_block { " [start]" } else { "" }
        );
    }
    for block in &grid.skipped {
        println!("  skipped duplicate at ({}, {}): block {}", block.x, block.z, block.block_number);
    }

    Ok(())
}

fn cmd_sound_extract(
    snd: &Path,
    output: &Path,
    index: Option<usize>,
    usage: UsageArg,
) -> Result<()> {
    let mut sounds = SoundArchive::new(open_archive(snd, usage)?);
    let indices: Vec<usize> = match index {
        Some(index) => vec![index],
        None => (0..sounds.count()).collect(),
    };

    fs::create_dir_all(output)?;
    let pb = progress_bar(indices.len())?;

    let mut written = 0;
    for index in indices {
        let sound = sounds.get_sound(index);
        if !sound.is_empty() {
            let path = record_output_path(output, &sound.name, index).with_extension("wav");
            fs::write(&path, sound.to_wav_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written += 1;
        }
        pb.inc(1);
    }
    sounds.discard_all();

    pb.finish_with_message("Done");
    println!("Wrote {written} sounds to {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_output_path_stays_inside() {
        let output = Path::new("out");

        assert_eq!(record_output_path(output, "PAL.PAL", 0), output.join("PAL.PAL"));
        assert_eq!(record_output_path(output, "../ESCAPE.TX", 3), output.join("record_3"));
        assert_eq!(record_output_path(output, "a\\b", 4), output.join("record_4"));
        assert_eq!(record_output_path(output, "", 5), output.join("record_5"));
        assert_eq!(record_output_path(output, "..", 6), output.join("record_6"));
        assert_eq!(record_output_path(output, "C:X", 7), output.join("record_7"));
    }

    #[test]
    fn test_extract_keeps_hostile_names_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let bsa = dir.path().join("evil.bsa");
        let mut builder = BsaBuilder::new(DirectoryType::Name);
        builder.add_named("../ESCAPE.TX", vec![1, 2, 3]).unwrap();
        builder.add_named("", vec![4]).unwrap();
        builder.write_to(&bsa).unwrap();

        let output = dir.path().join("nested").join("out");
        cmd_bsa_extract(&bsa, &output, None, UsageArg::Memory).unwrap();

        assert!(!dir.path().join("nested").join("ESCAPE.TX").exists());
        assert_eq!(fs::read(output.join("record_0")).unwrap(), vec![1, 2, 3]);
        assert_eq!(fs::read(output.join("record_1")).unwrap(), vec![4]);
    }
}
