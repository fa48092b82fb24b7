use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};

use crate::{Frame, ReportError};

// Landscape US letter.
const PAGE_WIDTH_MM: f64 = 279.4;
const PAGE_HEIGHT_MM: f64 = 215.9;
const MARGIN_MM: f64 = 18.0;
const TITLE_SIZE: f64 = 16.0;
const BODY_SIZE: f64 = 9.0;
const ROW_STEP_MM: f64 = 6.0;

pub fn write_pdf(frame: &Frame, path: &Path) -> Result<(), ReportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        frame.title.clone(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "table",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|error| ReportError::Pdf(error.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|error| ReportError::Pdf(error.to_string()))?;

    let column_width = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / frame.columns.len().max(1) as f64;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
    layer.use_text(frame.title.clone(), TITLE_SIZE, Mm(MARGIN_MM), Mm(y), &bold);
    y -= 10.0;
    draw_header(&layer, frame, &bold, y, column_width);
    y -= ROW_STEP_MM;

    for row in &frame.rows {
        if y < MARGIN_MM {
            let (page, page_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "table");
            layer = doc.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT_MM - MARGIN_MM;
            draw_header(&layer, frame, &bold, y, column_width);
            y -= ROW_STEP_MM;
        }

        for (index, cell) in row.iter().enumerate() {
            layer.use_text(
                cell.render(),
                BODY_SIZE,
                Mm(MARGIN_MM + column_width * index as f64),
                Mm(y),
                &font,
            );
        }
        y -= ROW_STEP_MM;
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|error| ReportError::Pdf(error.to_string()))?;
    Ok(())
}

fn draw_header(
    layer: &PdfLayerReference,
    frame: &Frame,
    bold: &IndirectFontRef,
    y: f64,
    column_width: f64,
) {
    for (index, name) in frame.columns.iter().enumerate() {
        layer.use_text(
            name.clone(),
            BODY_SIZE,
            Mm(MARGIN_MM + column_width * index as f64),
            Mm(y),
            bold,
        );
    }

    layer.set_outline_color(Color::Rgb(Rgb::new(0.2, 0.2, 0.2, None)));
    layer.set_outline_thickness(0.6);
    let rule_y = y - 1.5;
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN_MM), Mm(rule_y)), false),
            (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), Mm(rule_y)), false),
        ],
        is_closed: false,
    });
}
