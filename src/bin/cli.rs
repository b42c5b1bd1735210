//! CLI driver for the bridge operations.
//!
//! Usage:
//!   morph-bridge gray photo.jpg photo-gray.png
//!   morph-bridge delaunay --width 720 --height 960 points.json -o tris.json
//!   morph-bridge morph a.jpg b.jpg --points1 a.json --points2 b.json \
//!       --triangles tris.json --alpha 0.5 out.jpg
//!
//! Points files are JSON `[[x, y], ..]`; triangle files are JSON
//! `[[a, b, c], ..]` index triples.

use clap::{Parser, Subcommand};
use morph_bridge::{
    convert_to_gray_scale, load_image, make_delaunay, morph_images, save_image, Triangle,
    MOUTH_CONTOUR_LANDMARKS,
};
use opencv::core::Point2f;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "morph-bridge")]
#[command(author, version, about = "Grayscale, Delaunay and face-morph operations", long_about = None)]
struct Args {
    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an image to grayscale
    Gray {
        /// Input image file
        input: PathBuf,
        /// Output image file
        output: PathBuf,
    },
    /// Triangulate a landmark set and emit index triples
    Delaunay {
        /// Canvas width in pixels
        #[arg(long)]
        width: i32,
        /// Canvas height in pixels
        #[arg(long)]
        height: i32,
        /// JSON file with [[x, y], ..] landmarks
        points: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Morph two images under a shared triangulation
    Morph {
        /// First input image (geometry reference)
        img1: PathBuf,
        /// Second input image (texture source)
        img2: PathBuf,
        /// JSON landmark file for the first image
        #[arg(long)]
        points1: PathBuf,
        /// JSON landmark file for the second image
        #[arg(long)]
        points2: PathBuf,
        /// JSON triangle-index file shared by both landmark sets
        #[arg(long)]
        triangles: PathBuf,
        /// Blend weight between the normal and gradient-mixing clone
        #[arg(long, default_value_t = 0.5)]
        alpha: f32,
        /// Mouth contour landmark indices, comma separated
        #[arg(long, value_delimiter = ',')]
        mouth: Option<Vec<usize>>,
        /// Output image file
        output: PathBuf,
    },
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "morph_bridge=debug".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    match &args.command {
        Command::Gray { input, output } => {
            convert_to_gray_scale(path_str(input)?, path_str(output)?)?;
            if args.verbose {
                eprintln!("Wrote grayscale image to {:?}", output);
            }
        }
        Command::Delaunay {
            width,
            height,
            points,
            output,
        } => {
            let sites = read_points(points)?;
            let triangles = make_delaunay(*width, *height, &sites)?;

            let json = serde_json::to_string_pretty(&triangles)?;
            match output {
                Some(path) => fs::write(path, json)?,
                None => println!("{}", json),
            }
            if args.verbose {
                eprintln!("{} sites -> {} triangles", sites.len(), triangles.len());
            }
        }
        Command::Morph {
            img1,
            img2,
            points1,
            points2,
            triangles,
            alpha,
            mouth,
            output,
        } => {
            let image1 = load_image(path_str(img1)?)?;
            let image2 = load_image(path_str(img2)?)?;
            let pts1 = read_points(points1)?;
            let pts2 = read_points(points2)?;
            let topology = read_triangles(triangles)?;
            let mouth_contour: &[usize] = match mouth {
                Some(indices) => indices,
                None => &MOUTH_CONTOUR_LANDMARKS,
            };

            let composite = morph_images(
                &image1,
                &image2,
                &pts1,
                &pts2,
                &topology,
                *alpha,
                mouth_contour,
            )?;
            save_image(path_str(output)?, &composite)?;
            if args.verbose {
                eprintln!(
                    "Morphed {} triangles at alpha {} into {:?}",
                    topology.len(),
                    alpha,
                    output
                );
            }
        }
    }

    Ok(())
}

fn path_str(path: &Path) -> Result<&str, Box<dyn std::error::Error>> {
    path.to_str()
        .ok_or_else(|| format!("path is not valid UTF-8: {:?}", path).into())
}

fn read_points(path: &Path) -> Result<Vec<Point2f>, Box<dyn std::error::Error>> {
    let pairs: Vec<[f32; 2]> = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(pairs.into_iter().map(|[x, y]| Point2f::new(x, y)).collect())
}

fn read_triangles(path: &Path) -> Result<Vec<Triangle>, Box<dyn std::error::Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}
