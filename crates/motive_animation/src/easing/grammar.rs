//! Easing curve grammar
//!
//! Curve text is whitespace-stripped before it reaches this module. Accepted
//! forms:
//!
//! ```text
//! easing       := path | cubic-bezier | segments | spatial
//! path         := "path" args                         even count, times in (last, 1)
//! cubic-bezier := "cubic-bezier" args                 exactly 4
//! segments     := ("line" args | "curve" args)+ "end" args
//! spatial      := "spatial" args ("scurve" args)+ "send" args
//! args         := "(" [number ("," number)*] ")"
//! number       := "-"? digits ("." digits*)? | "-"? "." digits
//! ```
//!
//! Syntax is checked by the nom parsers below; each production is then run
//! through an explicit validation step (argument counts, strictly increasing
//! times, spatial index range) while the flat control-point array is built.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1},
    combinator::{all_consuming, cut, map, map_res, opt, recognize},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{many1, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
    Finish, IResult,
};
use thiserror::Error;

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Why a curve description was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EasingError {
    /// The text does not match the grammar
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// A form received the wrong number of arguments
    #[error("{form} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        form: &'static str,
        expected: String,
        actual: usize,
    },

    /// A segment does not start after the previous one
    #[error("{form} time {time} must be greater than {previous}")]
    TimeNotIncreasing {
        form: &'static str,
        time: f32,
        previous: f32,
    },

    /// A path point lies at or beyond the implicit end at time 1
    #[error("path time {0} must be less than 1")]
    PathTimeOutOfRange(f32),

    /// A spatial curve needs at least two axes
    #[error("spatial curve needs at least 2 degrees of freedom, got {0}")]
    SpatialDegreesOfFreedom(i32),

    /// The selected spatial axis does not exist
    #[error("spatial index {index} out of range for {dof} degrees of freedom")]
    SpatialIndex { index: i32, dof: i32 },
}

/// Result type for curve parsing
pub type Result<T> = std::result::Result<T, EasingError>;

/// Shape of a curve segment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Straight line to the next segment's start
    Linear,
    /// Cubic bezier ramp to the next segment's start
    Curve,
    /// Terminal point of a one-dimensional curve
    End,
    /// Spatial cubic segment
    SCurve,
    /// Terminal point of a spatial curve
    SEnd,
}

/// A segment and the index of its first control value in the point array
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    pub kind: SegmentKind,
    pub offset: usize,
}

/// Parsed curve before it is wrapped into an evaluable curve
///
/// Layouts per segment kind, starting at `offset`:
///
/// - `Linear`, `End`: `time, value`
/// - `Curve`: `time, value, x1, y1, x2, y2`
/// - spatial curves start with `dof, index` at offset 0, then
///   `SCurve`: `time, v[dof], tout[dof], tin[dof], x1, y1, x2, y2` and
///   `SEnd`: `time, v[dof]`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveDefinition {
    pub segments: Vec<Segment>,
    pub points: Vec<f32>,
}

impl CurveDefinition {
    /// The `path()` curve from (0,0) to (1,1)
    pub fn linear() -> Self {
        Self {
            segments: vec![
                Segment {
                    kind: SegmentKind::Linear,
                    offset: 0,
                },
                Segment {
                    kind: SegmentKind::End,
                    offset: 2,
                },
            ],
            points: vec![0.0, 0.0, 1.0, 1.0],
        }
    }

    pub fn is_spatial(&self) -> bool {
        self.segments
            .first()
            .is_some_and(|s| matches!(s.kind, SegmentKind::SCurve | SegmentKind::SEnd))
    }
}

// ============================================================================
// Syntax
// ============================================================================

#[derive(Debug)]
struct Call {
    keyword: &'static str,
    args: Vec<f32>,
}

#[derive(Debug)]
enum Form {
    Path(Vec<f32>),
    CubicBezier(Vec<f32>),
    Segments(Vec<Call>, Call),
    Spatial(Vec<f32>, Vec<Vec<f32>>, Vec<f32>),
}

fn number(input: &str) -> ParseResult<f32> {
    context(
        "number",
        map_res(
            recognize(pair(
                opt(char('-')),
                alt((
                    recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                    recognize(pair(char('.'), digit1)),
                )),
            )),
            str::parse::<f32>,
        ),
    )(input)
}

fn arguments(input: &str) -> ParseResult<Vec<f32>> {
    context(
        "argument list",
        delimited(
            char('('),
            separated_list0(char(','), number),
            char(')'),
        ),
    )(input)
}

/// A keyword followed by its arguments. Once the keyword matched, the
/// argument list is mandatory.
fn call(keyword: &'static str) -> impl FnMut(&str) -> ParseResult<Call> {
    move |input: &str| {
        let (input, args) = preceded(tag(keyword), cut(context(keyword, arguments)))(input)?;
        Ok((input, Call { keyword, args }))
    }
}

fn args_of(keyword: &'static str) -> impl FnMut(&str) -> ParseResult<Vec<f32>> {
    let mut call = call(keyword);
    move |input: &str| call(input).map(|(rest, c)| (rest, c.args))
}

fn path_form(input: &str) -> ParseResult<Form> {
    map(args_of("path"), Form::Path)(input)
}

fn bezier_form(input: &str) -> ParseResult<Form> {
    map(args_of("cubic-bezier"), Form::CubicBezier)(input)
}

fn segments_form(input: &str) -> ParseResult<Form> {
    map(
        pair(many1(alt((call("line"), call("curve")))), call("end")),
        |(segments, end)| Form::Segments(segments, end),
    )(input)
}

fn spatial_form(input: &str) -> ParseResult<Form> {
    map(
        tuple((args_of("spatial"), many1(args_of("scurve")), args_of("send"))),
        |(header, segments, end)| Form::Spatial(header, segments, end),
    )(input)
}

fn easing(input: &str) -> ParseResult<Form> {
    context(
        "easing",
        all_consuming(alt((path_form, bezier_form, segments_form, spatial_form))),
    )(input)
}

fn syntax_error(input: &str, err: VerboseError<&str>) -> EasingError {
    let offset = err
        .errors
        .first()
        .map(|(rest, _)| input.len() - rest.len())
        .unwrap_or(0);

    let mut parts = Vec::new();
    for (rest, kind) in &err.errors {
        match kind {
            VerboseErrorKind::Context(ctx) => parts.push(format!("in {}", ctx)),
            VerboseErrorKind::Char(c) => {
                let preview: String = rest.chars().take(12).collect();
                parts.push(format!("expected '{}' near \"{}\"", c, preview));
            }
            VerboseErrorKind::Nom(kind) => parts.push(format!("{:?}", kind)),
        }
    }
    let message = if parts.is_empty() {
        "unknown parse error".to_string()
    } else {
        parts.join(", ")
    };
    EasingError::Syntax { offset, message }
}

// ============================================================================
// Validation
// ============================================================================

fn expect_count(form: &'static str, args: &[f32], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(EasingError::ArgumentCount {
            form,
            expected: expected.to_string(),
            actual: args.len(),
        });
    }
    Ok(())
}

fn build_path(args: &[f32]) -> Result<CurveDefinition> {
    if args.len() % 2 != 0 {
        return Err(EasingError::ArgumentCount {
            form: "path",
            expected: "an even number of".to_string(),
            actual: args.len(),
        });
    }

    let mut definition = CurveDefinition::default();
    definition.points.extend_from_slice(&[0.0, 0.0]);
    definition.segments.push(Segment {
        kind: SegmentKind::Linear,
        offset: 0,
    });

    let mut last_time = 0.0f32;
    for pair in args.chunks_exact(2) {
        let (time, value) = (pair[0], pair[1]);
        if time <= last_time {
            return Err(EasingError::TimeNotIncreasing {
                form: "path",
                time,
                previous: last_time,
            });
        }
        if time >= 1.0 {
            return Err(EasingError::PathTimeOutOfRange(time));
        }
        definition.segments.push(Segment {
            kind: SegmentKind::Linear,
            offset: definition.points.len(),
        });
        definition.points.extend_from_slice(&[time, value]);
        last_time = time;
    }

    definition.segments.push(Segment {
        kind: SegmentKind::End,
        offset: definition.points.len(),
    });
    definition.points.extend_from_slice(&[1.0, 1.0]);
    Ok(definition)
}

fn build_cubic_bezier(args: &[f32]) -> Result<CurveDefinition> {
    expect_count("cubic-bezier", args, 4)?;
    let mut points = vec![0.0, 0.0];
    points.extend_from_slice(args);
    points.extend_from_slice(&[1.0, 1.0]);
    Ok(CurveDefinition {
        segments: vec![
            Segment {
                kind: SegmentKind::Curve,
                offset: 0,
            },
            Segment {
                kind: SegmentKind::End,
                offset: 6,
            },
        ],
        points,
    })
}

/// Append one segment after checking its arity and that it starts later than
/// the previous segment. The first segment may start anywhere.
fn push_segment(
    definition: &mut CurveDefinition,
    kind: SegmentKind,
    form: &'static str,
    args: &[f32],
    expected: usize,
) -> Result<()> {
    expect_count(form, args, expected)?;

    let time = args[0];
    if let Some(previous) = definition.segments.last() {
        let previous = definition.points[previous.offset];
        if time <= previous {
            return Err(EasingError::TimeNotIncreasing {
                form,
                time,
                previous,
            });
        }
    }

    definition.segments.push(Segment {
        kind,
        offset: definition.points.len(),
    });
    definition.points.extend_from_slice(args);
    Ok(())
}

fn build_segments(segments: &[Call], end: &Call) -> Result<CurveDefinition> {
    let mut definition = CurveDefinition::default();
    for segment in segments {
        let (kind, expected) = match segment.keyword {
            "line" => (SegmentKind::Linear, 2),
            _ => (SegmentKind::Curve, 6),
        };
        push_segment(
            &mut definition,
            kind,
            segment.keyword,
            &segment.args,
            expected,
        )?;
    }
    push_segment(&mut definition, SegmentKind::End, "end", &end.args, 2)?;
    Ok(definition)
}

fn build_spatial(header: &[f32], segments: &[Vec<f32>], end: &[f32]) -> Result<CurveDefinition> {
    expect_count("spatial", header, 2)?;
    let dof = header[0] as i32;
    let index = header[1] as i32;
    if dof < 2 {
        return Err(EasingError::SpatialDegreesOfFreedom(dof));
    }
    if index < 0 || index >= dof {
        return Err(EasingError::SpatialIndex { index, dof });
    }

    let n = dof as usize;
    let mut definition = CurveDefinition {
        segments: Vec::with_capacity(segments.len() + 1),
        points: vec![dof as f32, index as f32],
    };
    for args in segments {
        push_segment(
            &mut definition,
            SegmentKind::SCurve,
            "scurve",
            args,
            5 + 3 * n,
        )?;
    }
    push_segment(&mut definition, SegmentKind::SEnd, "send", end, 1 + n)?;
    Ok(definition)
}

/// Parse whitespace-free curve text into a validated definition
pub fn parse_definition(text: &str) -> Result<CurveDefinition> {
    let (_, form) = easing(text)
        .finish()
        .map_err(|err| syntax_error(text, err))?;

    match form {
        Form::Path(args) => build_path(&args),
        Form::CubicBezier(args) => build_cubic_bezier(&args),
        Form::Segments(segments, end) => build_segments(&segments, &end),
        Form::Spatial(header, segments, end) => build_spatial(&header, &segments, &end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_layout() {
        let definition = parse_definition("path(0.25,1,0.75,0)").unwrap();
        assert_eq!(definition.points, vec![0.0, 0.0, 0.25, 1.0, 0.75, 0.0, 1.0, 1.0]);
        let kinds: Vec<_> = definition.segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Linear,
                SegmentKind::Linear,
                SegmentKind::Linear,
                SegmentKind::End
            ]
        );
        assert_eq!(parse_definition("path()").unwrap(), CurveDefinition::linear());
    }

    #[test]
    fn test_bezier_layout() {
        let definition = parse_definition("cubic-bezier(.42,0,1,1)").unwrap();
        assert_eq!(definition.points, vec![0.0, 0.0, 0.42, 0.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(definition.segments[1].offset, 6);
    }

    #[test]
    fn test_number_forms() {
        assert!(parse_definition("line(0.,-1)end(1,1)").is_ok());
        assert!(parse_definition("line(-.5,.5)end(1,1)").is_ok());
        assert!(parse_definition("line(1e3,0)end(2000,1)").is_err());
        assert!(parse_definition("line(+1,0)end(2,1)").is_err());
    }

    #[test]
    fn test_syntax_errors() {
        for text in [
            "", "foo", "path(1", "path(", "line(a", "send(1,2,3)", "spatial(2,0)",
            "spatial(2,0)send(0,1,1)", "end(0,1)", "path()x", "Path()",
        ] {
            assert!(
                matches!(parse_definition(text), Err(EasingError::Syntax { .. })),
                "{text:?} should be a syntax error"
            );
        }
    }

    #[test]
    fn test_argument_counts() {
        for text in [
            "path(1)",
            "path(1,2,3,4,5)",
            "cubic-bezier()",
            "cubic-bezier(1,2,3)",
            "line(1)end(1,1)",
            "line(1,2,3)end(4,1)",
            "curve(0,0)end(1,1)",
            "spatial(3,0)scurve(0,0,0,0,0,0,0,0.25,0.25,0.25,0.25)send(1,0,0)",
        ] {
            assert!(
                matches!(parse_definition(text), Err(EasingError::ArgumentCount { .. })),
                "{text:?} should fail on argument count"
            );
        }
    }

    #[test]
    fn test_time_ordering() {
        assert!(matches!(
            parse_definition("path(0,0)"),
            Err(EasingError::TimeNotIncreasing { .. })
        ));
        assert!(matches!(
            parse_definition("path(-.2,0)"),
            Err(EasingError::TimeNotIncreasing { .. })
        ));
        assert!(matches!(
            parse_definition("path(0.2,0.2,0.1,0.5)"),
            Err(EasingError::TimeNotIncreasing { .. })
        ));
        assert!(matches!(
            parse_definition("path(1,1)"),
            Err(EasingError::PathTimeOutOfRange(_))
        ));
        assert!(matches!(
            parse_definition("path(1.2,1)"),
            Err(EasingError::PathTimeOutOfRange(_))
        ));
        assert!(parse_definition("line(1,1)end(0,1)").is_err());
        assert!(parse_definition("curve(1,0,1,1,1,1)end(0,1)").is_err());
        assert!(parse_definition("line(0,1)line(2,1)end(1,1)").is_err());
        assert!(parse_definition("line(-1,0)end(10,1)").is_ok());
    }

    #[test]
    fn test_spatial_validation() {
        let segment = "scurve(0,0,0,1,0,0,-1,0.1,0.1,0.5,0.5)";
        assert!(parse_definition(&format!("spatial(2,0){segment}send(1,1,1)")).is_ok());
        assert!(matches!(
            parse_definition(&format!("spatial(1,0){segment}send(1,1,1)")),
            Err(EasingError::SpatialDegreesOfFreedom(1))
        ));
        assert!(matches!(
            parse_definition(&format!("spatial(2,2){segment}send(1,1,1)")),
            Err(EasingError::SpatialIndex { index: 2, dof: 2 })
        ));
        assert!(matches!(
            parse_definition(&format!("spatial(2,-1){segment}send(1,1,1)")),
            Err(EasingError::SpatialIndex { .. })
        ));
        assert!(matches!(
            parse_definition(&format!("spatial(2,0){segment}send(-1,0,0)")),
            Err(EasingError::TimeNotIncreasing { .. })
        ));
        assert!(matches!(
            parse_definition(&format!("spatial(2){segment}send(1,1,1)")),
            Err(EasingError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn test_spatial_layout() {
        let definition =
            parse_definition("spatial(2,1)scurve(0,0,0,1,0,0,-1,0.1,0.1,0.5,0.5)send(1,1,1)")
                .unwrap();
        assert!(definition.is_spatial());
        assert_eq!(&definition.points[..2], &[2.0, 1.0]);
        assert_eq!(definition.segments[0].offset, 2);
        assert_eq!(definition.segments[1].offset, 2 + 11);
        assert_eq!(definition.points.len(), 2 + 11 + 3);
    }
}
