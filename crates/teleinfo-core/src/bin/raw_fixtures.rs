use std::fs;
use std::path::{Path, PathBuf};

use teleinfo_core::protocol::layout;
use teleinfo_core::{compute_checksum, encode_frame, encode_group_line};

const ADCO_SINGLE_PHASE: &str = "031762120162";
const ADCO_TEMPO: &str = "021528603314";
const ADCO_THREE_PHASE: &str = "031428097115";

fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    write_capture(&root.join("cbemm_base"), &cbemm_base())?;
    write_capture(&root.join("cbemm_icc_tempo"), &cbemm_icc_tempo())?;
    write_capture(&root.join("cbetm_three_phase"), &cbetm_three_phase())?;
    write_capture(&root.join("damaged_stream"), &damaged_stream())?;
    write_capture(&root.join("adps_auto_repair"), &adps_auto_repair())?;
    Ok(())
}

fn write_capture(dir: &Path, bytes: &[u8]) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|err| format!("failed to create {}: {}", dir.display(), err))?;
    let path = dir.join("input.raw");
    fs::write(&path, bytes).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

fn base_lines<'a>(index: &'a str, iinst: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("ADCO", ADCO_SINGLE_PHASE),
        ("OPTARIF", "BASE"),
        ("ISOUSC", "30"),
        ("BASE", index),
        ("PTEC", "TH.."),
        ("IINST", iinst),
        ("IMAX", "090"),
        ("MOTDETAT", "000000"),
    ]
}

fn cbemm_base() -> Vec<u8> {
    let mut bytes = vec![0x00, 0xFF, layout::CR, layout::LF];
    for (index, iinst) in [("190575", "001"), ("190576", "002")] {
        let mut lines = base_lines(index, iinst);
        // Historic single-phase meters send HHPHC on every option.
        lines.insert(7, ("HHPHC", "A"));
        bytes.extend(encode_frame(lines));
    }
    bytes
}

fn tempo_lines<'a>(ptec: &'a str, demain: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("ADCO", ADCO_TEMPO),
        ("OPTARIF", "BBRJ"),
        ("ISOUSC", "45"),
        ("BBRHCJB", "001234567"),
        ("BBRHPJB", "000765432"),
        ("BBRHCJW", "000011111"),
        ("BBRHPJW", "000022222"),
        ("BBRHCJR", "000003333"),
        ("BBRHPJR", "000004444"),
        ("PTEC", ptec),
        ("DEMAIN", demain),
        ("IINST", "012"),
        ("IMAX", "060"),
        ("PAPP", "02830"),
        ("HHPHC", "Y"),
        ("MOTDETAT", "000000"),
        ("DATE", "E240305143000"),
    ]
}

fn cbemm_icc_tempo() -> Vec<u8> {
    let mut bytes = encode_frame(tempo_lines("HPJB", "----"));
    bytes.extend(encode_frame(tempo_lines("HCJB", "ROUG")));
    bytes
}

fn three_phase_long_lines(papp: &str) -> Vec<(&str, &str)> {
    vec![
        ("ADCO", ADCO_THREE_PHASE),
        ("OPTARIF", "HC.."),
        ("ISOUSC", "20"),
        ("HCHC", "001065963"),
        ("HCHP", "001521211"),
        ("PTEC", "HP.."),
        ("IINST1", "001"),
        ("IINST2", "000"),
        ("IINST3", "002"),
        ("IMAX1", "024"),
        ("IMAX2", "025"),
        ("IMAX3", "026"),
        ("PMAX", "07340"),
        ("PAPP", papp),
        ("HHPHC", "A"),
        ("MOTDETAT", "000000"),
        ("PPOT", "00"),
    ]
}

fn cbetm_three_phase() -> Vec<u8> {
    let mut bytes = encode_frame(three_phase_long_lines("00640"));
    bytes.extend(encode_frame([
        ("ADCO", ADCO_THREE_PHASE),
        ("IINST1", "031"),
        ("IINST2", "002"),
        ("IINST3", "004"),
        ("ADIR1", "031"),
        ("ADIR2", "000"),
        ("ADIR3", "000"),
    ]));
    bytes.extend(encode_frame(three_phase_long_lines("00650")));
    bytes
}

/// Group line carrying an arbitrary checksum character.
fn line_with_checksum(label: &str, value: &str, checksum: u8) -> Vec<u8> {
    let mut line = encode_group_line(label, value);
    let at = line.len() - 2;
    line[at] = checksum;
    line
}

/// Checksum emitted by meters affected by the ADPS firmware defect.
fn adps_firmware_checksum(value: &str) -> u8 {
    let sum: u32 = "ADPS"
        .bytes()
        .chain([layout::SP])
        .chain(value.bytes())
        .map(u32::from)
        .sum();
    (((sum + 1) & layout::CHECKSUM_MASK) as u8) + layout::CHECKSUM_OFFSET
}

fn frame_from_parts(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut frame = vec![layout::STX];
    for part in parts {
        frame.extend_from_slice(part);
    }
    frame.push(layout::ETX);
    frame
}

fn damaged_stream() -> Vec<u8> {
    let mut bytes = Vec::new();

    // Optional lines damaged in transit; the frame still classifies.
    let motdetat_checksum = compute_checksum("MOTDETAT", "000000") ^ 0x01;
    bytes.extend(frame_from_parts(&[
        encode_group_line("ADCO", ADCO_SINGLE_PHASE),
        encode_group_line("OPTARIF", "BASE"),
        encode_group_line("ISOUSC", "30"),
        encode_group_line("BASE", "190575"),
        encode_group_line("PTEC", "TH.."),
        encode_group_line("IINST", "001"),
        b"\nNOSEP\r".to_vec(),
        line_with_checksum("ADPS", "037", adps_firmware_checksum("037")),
        encode_group_line("IMAX", "090"),
        line_with_checksum("MOTDETAT", "000000", motdetat_checksum),
    ]));

    // Cut short by an end-of-transmission marker.
    bytes.push(layout::STX);
    bytes.extend(encode_group_line("ADCO", ADCO_SINGLE_PHASE));
    bytes.extend(encode_group_line("ISOUSC", "30"));
    bytes.push(layout::EOT);

    bytes.extend_from_slice(b"garbage");

    // Foreign, unknown, unparsable and repeated labels.
    bytes.extend(encode_frame([
        ("ADCO", ADCO_SINGLE_PHASE),
        ("ISOUSC", "30"),
        ("BASE", "190576"),
        ("HCHC", "000000042"),
        ("PTEC", "TH.."),
        ("IINST", "001"),
        ("IINST", "003"),
        ("IMAX", "090"),
        ("PAPP", "0A270"),
        ("FOO", "12"),
    ]));

    // Too few labels for any variant.
    bytes.extend(encode_frame([("ADCO", ADCO_SINGLE_PHASE), ("PAPP", "00270")]));

    // Truncated by the end of the capture.
    bytes.push(layout::STX);
    bytes.extend(encode_group_line("ADCO", ADCO_SINGLE_PHASE));
    bytes
}

fn adps_auto_repair() -> Vec<u8> {
    let mut lines: Vec<Vec<u8>> = base_lines("190575", "031")
        .into_iter()
        .map(|(label, value)| encode_group_line(label, value))
        .collect();
    lines.insert(6, line_with_checksum("ADPS", "037", adps_firmware_checksum("037")));
    frame_from_parts(&lines)
}
