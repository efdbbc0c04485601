//! Descriptor language parser (`surfaces*.txt`).
//!
//! Line oriented, brace delimited. The parser is resilient: a bad line is
//! logged, recorded in [`Surfaces::diagnostics`] and skipped, and parsing
//! carries on with the next line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::idspec::IdSpec;
use crate::model::{
    Animation, AnimationId, Collision, CollisionKind, Element, Interval, Method, Pattern, Surface,
    SurfaceId,
};

/// All surfaces of one shell plus the descriptor format version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surfaces {
    version: i32,
    surfaces: BTreeMap<SurfaceId, Surface>,
    #[serde(skip)]
    diagnostics: Vec<ParseError>,
}

impl Surfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SurfaceId, &Surface)> {
        self.surfaces.iter()
    }

    /// Every line rejected so far, in the order encountered.
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    /// Register a bare image as surface `id`: a single base element at the origin.
    pub fn add_image_surface(&mut self, id: SurfaceId, file: impl Into<PathBuf>) {
        self.surfaces.entry(id).or_default().elements.insert(
            0,
            Element {
                method: Method::Base,
                x: 0,
                y: 0,
                file: file.into(),
            },
        );
    }

    /// Parse descriptor text into this collection. Element file names are
    /// joined onto `base_dir` when given.
    pub fn parse_str(&mut self, text: &str, base_dir: Option<&Path>) {
        let mut parser = Parser::new(self, base_dir);
        for (line_no, line) in logical_lines(text) {
            parser.line(line_no, line);
        }
        parser.finish();
    }
}

/// Parse a standalone descriptor.
pub fn parse_descriptor(text: &str) -> Surfaces {
    let mut surfaces = Surfaces::new();
    surfaces.parse_str(text, None);
    surfaces
}

/// Split text into trimmed logical lines tagged with their 1-based source line.
/// Braces are split off so `surface0 { element0,... }` reads like the
/// multi-line form.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut out = Vec::new();
    for (idx, raw) in text.split('\n').enumerate() {
        let line_no = idx + 1;
        let line: String = raw.chars().filter(|c| *c != '\r').collect();
        let line = line.trim_matches(|c| c == ' ' || c == '\t');
        if line.starts_with("//") || !line.contains(|c| c == '{' || c == '}') {
            out.push((line_no, line.to_string()));
            continue;
        }
        let mut acc = String::new();
        for c in line.chars() {
            match c {
                '{' => {
                    acc.push('{');
                    out.push((line_no, acc.trim().to_string()));
                    acc.clear();
                }
                '}' => {
                    if !acc.trim().is_empty() {
                        out.push((line_no, acc.trim().to_string()));
                    }
                    out.push((line_no, "}".to_string()));
                    acc.clear();
                }
                _ => acc.push(c),
            }
        }
        if !acc.trim().is_empty() {
            out.push((line_no, acc.trim().to_string()));
        }
    }
    out
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Root,
    Descript,
    Surface,
    /// Inside a block we do not understand; wait for its `}`.
    Skip,
}

struct Block {
    append: bool,
    ids: IdSpec,
    body: Surface,
}

struct Parser<'a> {
    out: &'a mut Surfaces,
    base_dir: Option<&'a Path>,
    state: State,
    /// State entered by a `{` on its own line.
    pending: Option<State>,
    block: Option<Block>,
}

type LineResult = Result<(), ParseError>;

impl<'a> Parser<'a> {
    fn new(out: &'a mut Surfaces, base_dir: Option<&'a Path>) -> Self {
        Self {
            out,
            base_dir,
            state: State::Root,
            pending: None,
            block: None,
        }
    }

    fn report(&mut self, err: ParseError) {
        log::warn!("descriptor: {err}");
        self.out.diagnostics.push(err);
    }

    fn line(&mut self, line_no: usize, line: String) {
        if line_no == 1 && line.starts_with("charset,") {
            return;
        }
        let result = match self.state {
            State::Root => self.root_line(line_no, &line),
            State::Descript => {
                self.descript_line(line_no, &line);
                Ok(())
            }
            State::Surface => self.surface_line(line_no, &line),
            State::Skip => {
                if line == "}" {
                    self.state = State::Root;
                }
                Ok(())
            }
        };
        if let Err(err) = result {
            self.report(err);
        }
    }

    fn finish(&mut self) {
        if self.state != State::Root || self.pending.is_some() {
            self.report(ParseError::UnterminatedBlock);
        }
    }

    /// Enter `state` now if the header ends with `{`, otherwise on the next `{`.
    fn open(&mut self, header: &str, state: State) {
        if header.ends_with('{') {
            self.state = state;
            self.pending = None;
        } else {
            self.pending = Some(state);
        }
    }

    fn root_line(&mut self, line_no: usize, line: &str) -> LineResult {
        if line.is_empty() || line.starts_with("//") {
            return Ok(());
        }
        if line == "{" {
            return match self.pending.take() {
                Some(state) => {
                    self.state = state;
                    Ok(())
                }
                None => Err(ParseError::UnexpectedBrace { line: line_no }),
            };
        }
        let header = line.trim_end_matches('{').trim_end();
        if header == "descript" {
            self.open(line, State::Descript);
            return Ok(());
        }
        let (append, spec) = if let Some(rest) = header.strip_prefix("surface.append") {
            (true, rest)
        } else if let Some(rest) = header.strip_prefix("surface") {
            (false, rest)
        } else {
            return self.unknown_root_line(line_no, line);
        };
        let spec = spec.trim();
        if !spec.starts_with(|c: char| c.is_ascii_digit() || c == '!') {
            // surface.alias and friends
            return self.unknown_root_line(line_no, line);
        }
        match IdSpec::parse(spec) {
            Ok(ids) => {
                self.block = Some(Block {
                    append,
                    ids,
                    body: Surface::default(),
                });
                self.open(line, State::Surface);
                Ok(())
            }
            Err(value) => {
                self.block = None;
                self.open(line, State::Skip);
                Err(ParseError::InvalidNumber {
                    line: line_no,
                    field: "surface id",
                    value,
                })
            }
        }
    }

    fn unknown_root_line(&mut self, line_no: usize, line: &str) -> LineResult {
        if line.ends_with('{') || !line.contains(',') {
            log::debug!("descriptor: skipping unsupported block {line:?} at line {line_no}");
            self.open(line, State::Skip);
            return Ok(());
        }
        Err(ParseError::UnexpectedLine {
            line: line_no,
            text: line.to_string(),
        })
    }

    fn descript_line(&mut self, line_no: usize, line: &str) {
        if line == "}" {
            self.state = State::Root;
            return;
        }
        if let Some(rest) = line.strip_prefix("version,") {
            match rest.trim().parse() {
                Ok(v) => self.out.version = v,
                Err(_) => self.report(ParseError::InvalidNumber {
                    line: line_no,
                    field: "version",
                    value: rest.trim().to_string(),
                }),
            }
        } else if !line.is_empty() && !line.starts_with("//") {
            log::debug!("descriptor: ignoring descript entry {line:?} at line {line_no}");
        }
    }

    fn surface_line(&mut self, line_no: usize, line: &str) -> LineResult {
        if line == "}" {
            self.close_block();
            return Ok(());
        }
        if line.is_empty() || line.starts_with("//") || line == "{" {
            return Ok(());
        }
        let Some(block) = self.block.as_mut() else {
            return Ok(());
        };
        let body = &mut block.body;
        if let Some(rest) = line.strip_prefix("element") {
            parse_element(line_no, rest, self.base_dir, body)
        } else if let Some(rest) = line.strip_prefix("animation") {
            parse_animation(line_no, rest, body)
        } else if let Some(rest) = line.strip_prefix("collisionex") {
            parse_collision_ex(line_no, rest, body)
        } else if let Some(rest) = line.strip_prefix("collision") {
            parse_collision(line_no, rest, body)
        } else if line.starts_with("sakura.balloon.offset")
            || line.starts_with("kero.balloon.offset")
            || line.starts_with("balloon")
            || line.starts_with("point")
        {
            Ok(())
        } else {
            log::debug!("descriptor: ignoring {line:?} at line {line_no}");
            Ok(())
        }
    }

    fn close_block(&mut self) {
        self.state = State::Root;
        let Some(block) = self.block.take() else {
            return;
        };
        if block.append {
            for (id, surface) in self.out.surfaces.iter_mut() {
                if block.ids.contains(*id) {
                    surface.merge(&block.body);
                }
            }
            return;
        }
        for id in block.ids.ids() {
            self.out.surfaces.entry(id).or_default().merge(&block.body);
        }
    }
}

fn fields(rest: &str) -> Vec<&str> {
    rest.split(',').map(str::trim).collect()
}

fn field<'f>(
    fields: &[&'f str],
    idx: usize,
    line: usize,
    name: &'static str,
) -> Result<&'f str, ParseError> {
    fields
        .get(idx)
        .copied()
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingField { line, field: name })
}

fn number(value: &str, line: usize, name: &'static str) -> Result<i32, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        line,
        field: name,
        value: value.trim().to_string(),
    })
}

/// Optional trailing coordinate; absent means 0.
fn coord(fields: &[&str], idx: usize, line: usize, name: &'static str) -> Result<i32, ParseError> {
    match fields.get(idx) {
        Some(v) if !v.is_empty() => number(v, line, name),
        _ => Ok(0),
    }
}

fn parse_method(value: &str, line: usize) -> Result<Method, ParseError> {
    value.parse().map_err(|_| ParseError::UnknownMethod {
        line,
        method: value.to_string(),
    })
}

/// `element<id>,<method>,<file>,<x>,<y>`
fn parse_element(
    line: usize,
    rest: &str,
    base_dir: Option<&Path>,
    body: &mut Surface,
) -> LineResult {
    let f = fields(rest);
    let id = number(field(&f, 0, line, "element id")?, line, "element id")?;
    let method_name = field(&f, 1, line, "element method")?;
    let method = parse_method(method_name, line)?;
    if !method.is_synthesizable() {
        return Err(ParseError::MethodNotAllowed {
            line,
            method: method_name.to_string(),
        });
    }
    let file = field(&f, 2, line, "element file")?;
    let x = coord(&f, 3, line, "element x")?;
    let y = coord(&f, 4, line, "element y")?;
    let file = match base_dir {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    };
    body.elements.insert(id, Element { method, x, y, file });
    Ok(())
}

/// `animation<id>.interval,...` or `animation<id>.pattern<n>,...`
fn parse_animation(line: usize, rest: &str, body: &mut Surface) -> LineResult {
    let Some((id, rest)) = rest.split_once('.') else {
        return Err(ParseError::MissingField {
            line,
            field: "animation key",
        });
    };
    let id = number(id, line, "animation id")?;
    let f = fields(rest);
    let key = f[0];
    if key == "interval" {
        parse_interval(line, id, &f, body)
    } else if let Some(index) = key.strip_prefix("pattern") {
        let index = number(index, line, "pattern index")?;
        let index = usize::try_from(index).map_err(|_| ParseError::InvalidNumber {
            line,
            field: "pattern index",
            value: index.to_string(),
        })?;
        parse_pattern(line, id, index, &f, body)
    } else {
        log::debug!("descriptor: ignoring animation{id}.{key} at line {line}");
        Ok(())
    }
}

fn parse_interval(line: usize, id: AnimationId, f: &[&str], body: &mut Surface) -> LineResult {
    if body.animations.contains_key(&id) {
        return Err(ParseError::DuplicateAnimation { line, id });
    }
    let mut animation = Animation::default();
    let mut unknown = None;
    for tag in field(f, 1, line, "interval")?.split('+') {
        match tag.trim().parse::<Interval>() {
            Ok(interval) => {
                animation.intervals.insert(interval);
            }
            Err(()) => {
                unknown.get_or_insert_with(|| tag.trim().to_string());
            }
        }
    }
    let mut bad_factor = None;
    if let Some(factor) = f.get(2).filter(|s| !s.is_empty()) {
        match number(factor, line, "interval factor") {
            Ok(factor) => animation.interval_factor = factor,
            Err(err) => bad_factor = Some(err),
        }
    }
    animation.interval_factor = animation.interval_factor.max(1);
    body.animations.insert(id, animation);
    // unknown tags and a bad factor are dropped; the rest of the declaration stands
    if let Some(err) = bad_factor {
        return Err(err);
    }
    match unknown {
        Some(interval) => Err(ParseError::UnknownInterval { line, interval }),
        None => Ok(()),
    }
}

fn parse_pattern(
    line: usize,
    id: AnimationId,
    index: usize,
    f: &[&str],
    body: &mut Surface,
) -> LineResult {
    let Some(animation) = body.animations.get_mut(&id) else {
        return Err(ParseError::UndeclaredAnimation { line, id });
    };
    let len = animation.patterns.len();
    if index > len {
        return Err(ParseError::PatternIndexGap {
            line,
            animation: id,
            index,
            len,
        });
    }
    let method_name = field(f, 1, line, "pattern method")?;
    let method = parse_method(method_name, line)?;
    if animation.is_bind_only() && !method.is_synthesizable() {
        return Err(ParseError::MethodNotAllowed {
            line,
            method: method_name.to_string(),
        });
    }

    let pattern = if method.takes_surface() {
        let surface = number(field(f, 2, line, "pattern surface")?, line, "pattern surface")?;
        let wait = parse_wait(field(f, 3, line, "pattern wait")?, line)?;
        let x = coord(f, 4, line, "pattern x")?;
        let y = coord(f, 5, line, "pattern y")?;
        Pattern::synthesis(method, surface, wait, x, y)
    } else if method.takes_single_target() {
        let target = number(field(f, 2, line, "pattern target")?, line, "pattern target")?;
        Pattern::control(method, vec![target])
    } else {
        let list = f.get(2..).map(|rest| rest.join(",")).unwrap_or_default();
        let inner = list
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or(ParseError::MalformedTargetList { line })?;
        let targets = inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| number(s, line, "pattern target"))
            .collect::<Result<Vec<_>, _>>()?;
        if targets.is_empty() {
            return Err(ParseError::EmptyTargetList { line });
        }
        Pattern::control(method, targets)
    };

    if index < len {
        animation.patterns[index] = pattern;
    } else {
        animation.patterns.push(pattern);
    }
    Ok(())
}

/// `v` or `lo-hi`.
fn parse_wait(value: &str, line: usize) -> Result<(i32, i32), ParseError> {
    match value.split_once('-') {
        Some((lo, hi)) if !lo.trim().is_empty() => {
            Ok((number(lo, line, "wait min")?, number(hi, line, "wait max")?))
        }
        _ => {
            let v = number(value, line, "wait")?;
            Ok((v, v))
        }
    }
}

fn insert_collision(line: usize, id: i32, collision: Collision, body: &mut Surface) -> LineResult {
    if body.collisions.contains_key(&id) {
        return Err(ParseError::DuplicateCollision { line, id });
    }
    body.collisions.insert(id, collision);
    Ok(())
}

fn factor(line: usize) -> i32 {
    i32::try_from(line).unwrap_or(i32::MAX)
}

/// `collision<id>,x1,y1,x2,y2,<tag>`
fn parse_collision(line: usize, rest: &str, body: &mut Surface) -> LineResult {
    let f = fields(rest);
    let id = number(field(&f, 0, line, "collision id")?, line, "collision id")?;
    let mut points = Vec::with_capacity(4);
    for idx in 1..=4 {
        points.push(number(field(&f, idx, line, "collision point")?, line, "collision point")?);
    }
    let tag = field(&f, 5, line, "collision tag")?;
    let collision = Collision {
        factor: factor(line),
        kind: CollisionKind::Rect,
        id: tag.to_string(),
        points,
    };
    insert_collision(line, id, collision, body)
}

/// `collisionex<id>,<tag>,<kind>,<points...>`
fn parse_collision_ex(line: usize, rest: &str, body: &mut Surface) -> LineResult {
    let f = fields(rest);
    let id = number(field(&f, 0, line, "collision id")?, line, "collision id")?;
    let tag = field(&f, 1, line, "collision tag")?;
    let kind_name = field(&f, 2, line, "collision shape")?;
    let kind: CollisionKind = kind_name.parse().map_err(|_| ParseError::UnknownCollisionKind {
        line,
        kind: kind_name.to_string(),
    })?;
    let points = f[3..]
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| number(s, line, "collision point"))
        .collect::<Result<Vec<_>, _>>()?;
    let count = points.len();
    let bad = |kind: &'static str, expected: &'static str| ParseError::BadPointCount {
        line,
        kind,
        expected,
        count,
    };
    match kind {
        CollisionKind::Rect if count != 4 => return Err(bad("rect", "4")),
        CollisionKind::Ellipse if count != 4 => return Err(bad("ellipse", "4")),
        CollisionKind::Circle if count != 3 => return Err(bad("circle", "3")),
        CollisionKind::Polygon if count % 2 != 0 || count < 6 => {
            return Err(bad("polygon", "an even count of at least 6"))
        }
        _ => {}
    }
    let collision = Collision {
        factor: factor(line),
        kind,
        id: tag.to_string(),
        points,
    };
    insert_collision(line, id, collision, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braces_are_split_off() {
        let lines = logical_lines("surface0 { element0, base, a.png, 0, 0 }\n// a { comment }");
        let texts: Vec<_> = lines.iter().map(|(n, l)| (*n, l.as_str())).collect();
        assert_eq!(
            texts,
            vec![
                (1, "surface0 {"),
                (1, "element0, base, a.png, 0, 0"),
                (1, "}"),
                (2, "// a { comment }"),
            ]
        );
    }

    #[test]
    fn bom_and_cr_are_stripped() {
        let lines = logical_lines("\u{feff}descript\r\n{\r\n  version,1\r\n}\r\n");
        assert_eq!(lines[0].1, "descript");
        assert_eq!(lines[2].1, "version,1");
    }

    #[test]
    fn wait_spec_forms() {
        assert_eq!(parse_wait("50", 1), Ok((50, 50)));
        assert_eq!(parse_wait("50-120", 1), Ok((50, 120)));
        assert!(parse_wait("x", 1).is_err());
    }

    #[test]
    fn polygon_point_count_is_checked() {
        let mut body = Surface::default();
        let err = parse_collision_ex(3, "0,Head,polygon,0,0,10,0,10", &mut body).unwrap_err();
        assert!(matches!(err, ParseError::BadPointCount { count: 5, .. }));
        parse_collision_ex(4, "0,Head,polygon,0,0,10,0,10,10", &mut body).expect("valid polygon");
        assert_eq!(body.collisions[&0].points.len(), 6);
        assert_eq!(body.collisions[&0].factor, 4);
    }
}
