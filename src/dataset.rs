use crate::track::{Detection, FrameStream, MaskOverlap, Track};
use crate::utils::rle::RleMask;
use crate::Errors;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Reads a seqmap file enumerating the sequences of a dataset split.
///
/// One sequence per non-empty line; the first whitespace-separated token is
/// the sequence id, trailing tokens (frame ranges and the like) are ignored.
///
pub fn load_seqmap(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open seqmap {}", path.display()))?;
    let mut sequences = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Some(id) = line.split_whitespace().next() {
            sequences.push(id.to_string());
        }
    }
    Ok(sequences)
}

/// Loads the detections of one sequence from a text file.
///
/// One detection per line: `frame score class_id img_h img_w counts`, where
/// `counts` is the compressed RLE string of the mask. Detection ids are
/// assigned sequentially in file order. Masks stay run-length encoded.
///
/// The boundary validates what the tracker assumes: parseable fields,
/// confidence within `[0, 1]` and one mask canvas per sequence. An empty
/// stream is an input error.
///
pub fn load_detections(path: &Path) -> Result<FrameStream<RleMask>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open detections {}", path.display()))?;
    parse_detections(file)
}

/// Parses a detection stream, see [`load_detections`] for the format.
///
pub fn parse_detections<R: Read>(reader: R) -> Result<FrameStream<RleMask>> {
    let mut frames = FrameStream::new();
    let mut canvas: Option<(usize, usize)> = None;
    let mut next_id = 0u64;

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let lineno = index + 1;
        let line = line?;
        let mut fields = line.split_whitespace();
        if line.trim().is_empty() {
            continue;
        }

        let frame: usize = field(&mut fields, lineno, "frame")?;
        let confidence: f32 = field(&mut fields, lineno, "score")?;
        let class_id: i64 = field(&mut fields, lineno, "class_id")?;
        let height: usize = field(&mut fields, lineno, "img_h")?;
        let width: usize = field(&mut fields, lineno, "img_w")?;
        let counts = fields
            .next()
            .ok_or_else(|| Errors::MalformedDetection(lineno, "missing counts".into()))?;

        if !(0.0..=1.0).contains(&confidence) {
            return Err(Errors::MalformedDetection(
                lineno,
                format!("confidence {confidence} is outside [0, 1]"),
            )
            .into());
        }
        match canvas {
            None => canvas = Some((height, width)),
            Some((h, w)) if (h, w) != (height, width) => {
                return Err(Errors::CanvasMismatch(height, width, h, w).into());
            }
            _ => {}
        }

        let mask = RleMask::from_coco(height, width, counts)
            .with_context(|| format!("line {lineno}"))?;
        frames
            .entry(frame)
            .or_insert_with(Vec::new)
            .push(Detection::new(next_id, class_id, confidence, mask));
        next_id += 1;
    }

    if frames.is_empty() {
        return Err(Errors::EmptyDetectionStream.into());
    }
    Ok(frames)
}

fn field<'a, T, I>(fields: &mut I, lineno: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    I: Iterator<Item = &'a str>,
{
    let raw = fields
        .next()
        .ok_or_else(|| Errors::MalformedDetection(lineno, format!("missing {name}")))?;
    raw.parse().map_err(|e| {
        Errors::MalformedDetection(lineno, format!("bad {name} {raw:?}: {e}")).into()
    })
}

/// Writes the tracking result of one sequence.
///
/// One line per member detection of every reported track:
/// `detection_id track_id mean_score`. Track ids are zero-based positions in
/// the finished order; the mean score is repeated for every member.
///
pub fn write_tracks<M, W>(writer: W, tracks: &[Track<M>]) -> Result<()>
where
    M: MaskOverlap,
    W: Write,
{
    let mut writer = BufWriter::new(writer);
    for (track_id, track) in tracks.iter().enumerate() {
        let mean_score = track.mean_score();
        for detection in track.detections() {
            writeln!(writer, "{} {} {}", detection.detection_id(), track_id, mean_score)?;
        }
    }
    writer.flush()?;
    Ok(())
}
