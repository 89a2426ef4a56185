#![cfg(feature = "web")]
use crate::report::LabelCount;
use plotters::prelude::*;

/// Configuration options for the label chart
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the graph
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Label Frequency".to_string(),
            x_label: "analysis".to_string(),
            y_label: "count".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl GraphOptions {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Creates a bar chart of label frequencies
///
/// One bar per label, in the order given, rendered into memory and
/// returned as PNG bytes.
///
/// # Arguments
/// * `counts` - Label frequencies, usually most common first
/// * `options` - Graph styling options
///
/// # Examples
/// ```no_run
/// use sentiscope::graph::{GraphOptions, label_bar_chart};
/// use sentiscope::report::LabelCount;
///
/// let counts = vec![
///     LabelCount { label: "Positive".to_string(), count: 3 },
///     LabelCount { label: "Negative".to_string(), count: 1 },
/// ];
/// match label_bar_chart(&counts, &GraphOptions::default()) {
///     Ok(png) => println!("Chart created: {} bytes", png.len()),
///     Err(e) => eprintln!("Failed to create chart: {}", e),
/// }
/// ```
pub fn label_bar_chart(
    counts: &[LabelCount],
    options: &GraphOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut pixels = vec![0u8; options.width as usize * options.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let bars = counts.len().max(1) as u32;
        let max_y = counts.iter().map(|c| c.count).max().unwrap_or(0) as u32;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((0u32..bars).into_segmented(), 0u32..max_y + 1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_label_formatter(&|segment| axis_label(counts, segment))
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.filled())
                .margin(20)
                .data(
                    counts
                        .iter()
                        .enumerate()
                        .map(|(i, c)| (i as u32, c.count as u32)),
                ),
        )?;

        root.present()?;
    }

    encode_png(pixels, options.width, options.height)
}

/// Name printed under a bar
fn axis_label(counts: &[LabelCount], segment: &SegmentValue<u32>) -> String {
    match segment {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => counts
            .get(*i as usize)
            .map(|c| c.label.clone())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Wrap a raw RGB buffer in a PNG container
fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let image = image::RgbImage::from_raw(width, height, pixels)
        .ok_or("pixel buffer does not match the chart size")?;

    let mut png = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image).write_to(&mut png, image::ImageOutputFormat::Png)?;
    Ok(png.into_inner())
}
