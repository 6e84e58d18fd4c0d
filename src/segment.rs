// Segmentation Assembler: classifies each group of a metric-derived
// aggregate set into one of four quadrants by comparing two ratio
// dimensions against their medians across the current group set.
use crate::metrics::{aggregate, grouping_for, periods_in_range, Metric};
use crate::types::{FilterParams, JoinedRecord, SegmentRow};
use crate::util::median;

/// The two preset scatter views: space productivity and rent efficiency.
/// First metric of the pair is the value dimension, second the volume
/// dimension.
pub const AREA_SEGMENTATION: (Metric, Metric) = (Metric::SalesPerArea, Metric::UnitsPerArea);
pub const RENT_SEGMENTATION: (Metric, Metric) = (Metric::SalesPerRent, Metric::TicketsPerRent);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    Leader,
    ValueEfficient,
    VolumeDriver,
    Underperformer,
}

impl Quadrant {
    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::Leader => "Leader",
            Quadrant::ValueEfficient => "Value Efficient",
            Quadrant::VolumeDriver => "Volume Driver",
            Quadrant::Underperformer => "Underperformer",
        }
    }

    fn classify(value_dim: f64, volume_dim: f64, med_value: f64, med_volume: f64) -> Quadrant {
        match (value_dim >= med_value, volume_dim >= med_volume) {
            (true, true) => Quadrant::Leader,
            (true, false) => Quadrant::ValueEfficient,
            (false, true) => Quadrant::VolumeDriver,
            (false, false) => Quadrant::Underperformer,
        }
    }
}

/// Segment the filtered slice over a (value, volume) metric pair.
///
/// Groups follow the shared grouping rule; groups where either dimension
/// is undefined are left out before the medians are taken. Returns
/// `None` when fewer than 2 groups survive — a median split over one
/// point is noise, so the caller reports insufficient data instead.
pub fn segment(
    records: &[JoinedRecord],
    params: &FilterParams,
    dims: (Metric, Metric),
) -> Option<Vec<SegmentRow>> {
    let (Some(start), Some(end)) = (params.start, params.end) else {
        return None;
    };
    let periods = periods_in_range(start, end);
    let (value_metric, volume_metric) = dims;

    let mut points: Vec<SegmentRow> = aggregate(records, grouping_for(params), false)
        .iter()
        .filter_map(|agg| {
            let value_dim = value_metric.evaluate(agg, periods)?;
            let volume_dim = volume_metric.evaluate(agg, periods)?;
            Some(SegmentRow {
                key: agg.key.clone(),
                value_dim,
                volume_dim,
                total_sales: agg.total_sales,
                quadrant: String::new(),
            })
        })
        .collect();
    if points.len() < 2 {
        return None;
    }

    let med_value = median(points.iter().map(|p| p.value_dim).collect())?;
    let med_volume = median(points.iter().map(|p| p.volume_dim).collect())?;
    for p in &mut points {
        p.quadrant = Quadrant::classify(p.value_dim, p.volume_dim, med_value, med_volume)
            .label()
            .to_string();
    }
    points.sort_by(|a, b| {
        b.total_sales
            .partial_cmp(&a.total_sales)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    Some(points)
}
