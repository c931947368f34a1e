//! Self-contained HTML page for a [`DashboardModel`].

use crate::audit::TableRowKind;
use crate::normalize::SeriesPoint;

use super::model::{ChartSpec, DashboardModel};

const CHART_WIDTH: f64 = 720.0;
const CHART_HEIGHT: f64 = 260.0;
const CHART_PADDING: f64 = 44.0;

pub fn render_html(model: &DashboardModel) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html><head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{} analytics</title>\n",
        escape(&model.header.site_name)
    ));
    html.push_str("<style>\n");
    html.push_str("body { font-family: system-ui, sans-serif; max-width: 1100px; margin: 2rem auto; padding: 0 1rem; color: #222; }\n");
    html.push_str("header { border-bottom: 1px solid #ddd; margin-bottom: 1.5rem; }\n");
    html.push_str(".gauges { display: flex; flex-wrap: wrap; gap: 1.5rem; }\n");
    html.push_str(".gauge { text-align: center; width: 140px; }\n");
    html.push_str(".gauge .value { font-size: 1.4em; font-weight: 600; }\n");
    html.push_str("table { border-collapse: collapse; margin: 1rem 0; }\n");
    html.push_str("td, th { border: 1px solid #ddd; padding: 0.3rem 0.8rem; text-align: left; }\n");
    html.push_str("tr.category td { font-weight: 600; background: #f6f6f6; }\n");
    html.push_str(".chart { margin: 2rem 0; }\n");
    html.push_str(".description { color: #666; max-width: 720px; }\n");
    html.push_str(".increase { font-weight: 600; }\n");
    html.push_str("</style>\n</head><body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!(
        "<h1>{}</h1>\n",
        escape(&model.header.site_name)
    ));
    html.push_str(&format!(
        "<p>Property <code>{}</code> &middot; current {} &middot; previous {}</p>\n",
        escape(&model.header.property_id),
        model.header.current,
        model.header.previous
    ));
    html.push_str("</header>\n");

    render_audit(&mut html, model);

    html.push_str("<h2>Traffic</h2>\n");
    for chart in &model.charts {
        render_chart(&mut html, chart);
    }

    html.push_str("</body></html>\n");
    html
}

fn render_audit(html: &mut String, model: &DashboardModel) {
    let audit = &model.audit;
    html.push_str("<h2>Page audit</h2>\n");
    if let Some(url) = &audit.requested_url {
        html.push_str(&format!("<p>Audited <code>{}</code>", escape(url)));
        if let Some(at) = &audit.fetch_time {
            html.push_str(&format!(" at {}", escape(at)));
        }
        html.push_str("</p>\n");
    }

    html.push_str("<div class=\"gauges\">\n");
    for gauge in &audit.gauges {
        let percent = gauge.score_percent.clamp(0.0, 100.0);
        html.push_str("<div class=\"gauge\">\n");
        html.push_str("<svg viewBox=\"0 0 120 70\" width=\"140\">");
        html.push_str("<path d=\"M10,60 A50,50 0 0 1 110,60\" fill=\"none\" stroke=\"#eee\" stroke-width=\"12\"/>");
        html.push_str(&format!(
            "<path d=\"M10,60 A50,50 0 0 1 110,60\" fill=\"none\" stroke=\"{}\" stroke-width=\"12\" pathLength=\"100\" stroke-dasharray=\"{:.2} 100\"/>",
            gauge_color(percent),
            percent
        ));
        html.push_str("</svg>\n");
        html.push_str(&format!(
            "<div class=\"value\">{}</div><div>{}</div>\n",
            format_value(gauge.score_percent),
            escape(gauge.display_label())
        ));
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");

    html.push_str("<table>\n<tr><th>Audit</th><th>Score</th></tr>\n");
    for row in &audit.table {
        let class = match row.kind {
            TableRowKind::Category => "category",
            TableRowKind::Audit => "audit",
        };
        let score = row
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td></tr>\n",
            class,
            escape(row.display_label()),
            score
        ));
    }
    html.push_str("</table>\n");
}

fn render_chart(html: &mut String, chart: &ChartSpec) {
    html.push_str(&format!(
        "<section class=\"chart\" id=\"{}\">\n",
        escape(&chart.metric_key)
    ));
    html.push_str(&format!("<h3>{}</h3>\n", escape(&chart.title)));
    if !chart.description.is_empty() {
        html.push_str(&format!(
            "<p class=\"description\">{}</p>\n",
            escape(&chart.description)
        ));
    }
    if let Some(increase) = chart.increase {
        html.push_str(&format!(
            "<p class=\"increase\">Month-over-month: {:.2}%</p>\n",
            increase
        ));
    }
    html.push_str(&line_chart_svg(&chart.points));
    html.push_str("</section>\n");
}

/// Line chart with one value label per point.
fn line_chart_svg(points: &[SeriesPoint]) -> String {
    if points.is_empty() {
        return "<p class=\"empty\">No data for this period.</p>\n".to_string();
    }

    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.value), hi.max(p.value))
        });
    let inner_w = CHART_WIDTH - 2.0 * CHART_PADDING;
    let inner_h = CHART_HEIGHT - 2.0 * CHART_PADDING;

    let x = |i: usize| {
        if points.len() == 1 {
            CHART_WIDTH / 2.0
        } else {
            CHART_PADDING + inner_w * i as f64 / (points.len() - 1) as f64
        }
    };
    let y = |v: f64| {
        if max == min {
            CHART_HEIGHT / 2.0
        } else {
            CHART_PADDING + inner_h * (max - v) / (max - min)
        }
    };

    let mut svg = format!(
        "<svg viewBox=\"0 0 {w} {h}\" width=\"{w}\" height=\"{h}\" role=\"img\">\n",
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );
    svg.push_str(&format!(
        "<line x1=\"{p}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#ccc\"/>\n",
        p = CHART_PADDING,
        r = CHART_WIDTH - CHART_PADDING,
        b = CHART_HEIGHT - CHART_PADDING + 8.0
    ));

    let path: Vec<String> = points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:.1},{:.1}", x(i), y(p.value)))
        .collect();
    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"#1f77b4\" stroke-width=\"2\" points=\"{}\"/>\n",
        path.join(" ")
    ));

    for (i, p) in points.iter().enumerate() {
        let (cx, cy) = (x(i), y(p.value));
        svg.push_str(&format!(
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"#1f77b4\"><title>{}</title></circle>\n",
            cx, cy, p.date
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" text-anchor=\"middle\">{}</text>\n",
            cx,
            cy - 8.0,
            format_value(p.value)
        ));
    }

    let baseline = CHART_HEIGHT - CHART_PADDING + 24.0;
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"start\">{}</text>\n",
        CHART_PADDING, baseline, points[0].date
    ));
    if points.len() > 1 {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"end\">{}</text>\n",
            CHART_WIDTH - CHART_PADDING,
            baseline,
            points[points.len() - 1].date
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn gauge_color(percent: f64) -> &'static str {
    if percent >= 90.0 {
        "#0c6"
    } else if percent >= 50.0 {
        "#fa3"
    } else {
        "#f33"
    }
}

/// Whole numbers without decimals, everything else to two places.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
