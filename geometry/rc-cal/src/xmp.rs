//! RealityCapture XMP sidecar files.
use std::io::Write;
use std::path::Path;

use xml::writer::{EmitterConfig, XmlEvent};

use crate::{IoContext, Result};

const NS_X: &str = "adobe:ns:meta";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_XCR: &str = "http://www.capturingreality.com/ns/xcr/1.1#";

const COMPONENT_ID: &str = "{974ED9D1-3334-48D6-9434-F68A4A7BBC01}";

/// Calibration of one image, the content of one sidecar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    /// 35mm-equivalent focal length in millimeters
    pub focal_length_35mm: f64,
    /// Nine space separated values, column-major. `None` omits the
    /// `Rotation` element.
    pub rotation: Option<String>,
    /// Three space separated values.
    pub position: String,
}

/// Sidecar file name for the image at `index`.
pub fn xmp_filename(index: usize) -> String {
    format!("image_{index:03}.xmp")
}

/// Format a focal length like `'%f' % value` with trailing zeros stripped.
///
/// The decimal point itself is kept, so `10.0` becomes `"10."`.
pub fn format_focal_length(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{value:.6}").trim_end_matches('0').to_string()
}

/// Serialize `record` as an XMP document.
pub fn write_xmp<W: Write>(wtr: W, record: &CalibrationRecord) -> Result<()> {
    let mut writer = EmitterConfig::new()
        .write_document_declaration(false)
        .perform_indent(true)
        .indent_string("  ")
        .create_writer(wtr);

    let focal_length = format_focal_length(record.focal_length_35mm);

    writer.write(XmlEvent::start_element("x:xmpmeta").ns("x", NS_X))?;
    writer.write(XmlEvent::start_element("rdf:RDF").ns("rdf", NS_RDF))?;
    writer.write(
        XmlEvent::start_element("rdf:Description")
            .ns("xcr", NS_XCR)
            .attr("xcr:Version", "2")
            .attr("xcr:PosePrior", "locked")
            .attr("xcr:ComponentId", COMPONENT_ID)
            .attr("xcr:DistortionModel", "perspective")
            .attr("xcr:DistortionCoeficients", "0 0 0 0 0 0")
            .attr("xcr:FocalLength35mm", &focal_length)
            .attr("xcr:Skew", "0")
            .attr("xcr:AspectRatio", "1")
            .attr("xcr:PrincipalPointU", "0")
            .attr("xcr:PrincipalPointV", "0")
            .attr("xcr:CalibrationPrior", "locked")
            .attr("xcr:CalibrationGroup", "-1")
            .attr("xcr:DistortionGroup", "-1")
            .attr("xcr:InTexturing", "1")
            .attr("xcr:InColoring", "0")
            .attr("xcr:InMeshing", "1"),
    )?;

    if let Some(rotation) = &record.rotation {
        writer.write(XmlEvent::start_element("xcr:Rotation"))?;
        writer.write(XmlEvent::characters(rotation))?;
        writer.write(XmlEvent::end_element())?;
    }

    writer.write(XmlEvent::start_element("xcr:Position"))?;
    writer.write(XmlEvent::characters(&record.position))?;
    writer.write(XmlEvent::end_element())?;

    writer.write(XmlEvent::end_element())?; // rdf:Description
    writer.write(XmlEvent::end_element())?; // rdf:RDF
    writer.write(XmlEvent::end_element())?; // x:xmpmeta

    let mut wtr = writer.into_inner();
    wtr.write_all(b"\n").map_err(xml::writer::Error::from)?;
    Ok(())
}

/// Write `record` to the file at `path`.
pub fn save_xmp(path: &Path, record: &CalibrationRecord) -> Result<()> {
    let fd = std::fs::File::create(path).at_path(path)?;
    let mut wtr = std::io::BufWriter::new(fd);
    write_xmp(&mut wtr, record)?;
    wtr.flush().at_path(path)
}
