use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::api::types::{parse_hex_color, Course, CourseInput, CourseWrite};
use crate::ui::renderfns::course_color;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Fields of the course form, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Name,
  Code,
  Professor,
  Credits,
  CurrentGrade,
  Semester,
  Color,
}

const FIELDS: [Field; 7] = [
  Field::Name,
  Field::Code,
  Field::Professor,
  Field::Credits,
  Field::CurrentGrade,
  Field::Semester,
  Field::Color,
];

impl Field {
  fn label(self) -> &'static str {
    match self {
      Field::Name => "Course Name",
      Field::Code => "Course Code",
      Field::Professor => "Professor",
      Field::Credits => "Credits",
      Field::CurrentGrade => "Current Grade",
      Field::Semester => "Semester",
      Field::Color => "Color",
    }
  }

  fn placeholder(self) -> &'static str {
    match self {
      Field::Name => "e.g., Anatomy & Physiology II",
      Field::Code => "e.g., NURS 202",
      Field::Professor => "e.g., Dr. Smith",
      Field::Credits => "3",
      Field::CurrentGrade => "85.5",
      Field::Semester => "Spring 2024",
      Field::Color => "#rrggbb",
    }
  }

  fn required(self) -> bool {
    matches!(self, Field::Name | Field::Code)
  }

  fn index(self) -> usize {
    FIELDS.iter().position(|f| *f == self).unwrap_or(0)
  }
}

/// Events emitted by the course form
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
  /// Validated write, ready to hand to a mutation
  Submit(CourseWrite),
  Cancelled,
}

/// Modal add/edit form for one course.
///
/// Opened empty for a create or prefilled from a course for an update.
/// Submission stays blocked until the required fields are present and the
/// numeric and colour fields parse.
#[derive(Debug, Clone)]
pub struct CourseForm {
  open: bool,
  editing: Option<i64>,
  inputs: Vec<TextInput>,
  focus: usize,
  error: Option<String>,
  submitting: bool,
  default_color: String,
}

impl CourseForm {
  pub fn new(default_color: impl Into<String>) -> Self {
    Self {
      open: false,
      editing: None,
      inputs: vec![TextInput::new(); FIELDS.len()],
      focus: 0,
      error: None,
      submitting: false,
      default_color: default_color.into(),
    }
  }

  pub fn is_open(&self) -> bool {
    self.open
  }

  /// Id of the course being edited, `None` when adding
  pub fn editing(&self) -> Option<i64> {
    self.editing
  }

  /// Open an empty form for a new course
  pub fn open_create(&mut self) {
    self.reset();
    self.inputs[Field::Color.index()].set_value(self.default_color.clone());
    self.open = true;
  }

  /// Open the form prefilled from `course`
  pub fn open_edit(&mut self, course: &Course) {
    self.reset();
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let values = [
      course.name.clone(),
      course.code.clone(),
      text(&course.professor),
      course.credits.map(|c| c.to_string()).unwrap_or_default(),
      text(&course.current_grade),
      text(&course.semester),
      course.color.clone(),
    ];
    self.inputs = values.into_iter().map(TextInput::with_value).collect();
    self.editing = Some(course.id);
    self.open = true;
  }

  /// Close the form and forget the edited course
  pub fn close(&mut self) {
    self.reset();
    self.open = false;
  }

  fn reset(&mut self) {
    self.inputs.iter_mut().for_each(TextInput::clear);
    self.editing = None;
    self.focus = 0;
    self.error = None;
    self.submitting = false;
  }

  /// Mark a submission as in flight (blocks resubmits) or settled
  pub fn set_submitting(&mut self, submitting: bool) {
    self.submitting = submitting;
    if submitting {
      self.error = None;
    }
  }

  pub fn is_submitting(&self) -> bool {
    self.submitting
  }

  /// Show a failure inline, keeping the entered values
  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
    self.submitting = false;
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  fn value(&self, field: Field) -> &str {
    self.inputs[field.index()].value().trim()
  }

  fn optional(&self, field: Field) -> Option<String> {
    match self.value(field) {
      "" => None,
      v => Some(v.to_string()),
    }
  }

  /// Validate the fields and build the write to submit.
  ///
  /// Editing yields an update keyed by the course id, otherwise a create.
  pub fn submission(&self) -> Result<CourseWrite, String> {
    for field in FIELDS.iter().filter(|f| f.required()) {
      if self.value(*field).is_empty() {
        return Err(format!("{} is required", field.label()));
      }
    }

    let credits = match self.value(Field::Credits) {
      "" => None,
      raw => Some(
        raw
          .parse::<i64>()
          .map_err(|_| format!("Credits must be a whole number, got {:?}", raw))?,
      ),
    };

    let color = match self.value(Field::Color) {
      "" => self.default_color.clone(),
      raw if parse_hex_color(raw).is_some() => raw.to_lowercase(),
      raw => return Err(format!("Color must look like #10b981, got {:?}", raw)),
    };

    let input = CourseInput {
      name: self.value(Field::Name).to_string(),
      code: self.value(Field::Code).to_string(),
      professor: self.optional(Field::Professor),
      credits,
      semester: self.optional(Field::Semester),
      current_grade: self.optional(Field::CurrentGrade),
      color,
    };

    Ok(match self.editing {
      Some(id) => CourseWrite::Update { id, input },
      None => CourseWrite::Create(input),
    })
  }

  fn focus_next(&mut self) {
    self.focus = (self.focus + 1) % FIELDS.len();
  }

  fn focus_previous(&mut self) {
    self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len();
  }

  /// Handle a key event while open.
  ///
  /// Tab/Down and Shift-Tab/Up move between fields, Enter on the last field
  /// or Ctrl-S submits, Esc cancels unless a save is in flight.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.open {
      return KeyResult::NotHandled;
    }

    match key.code {
      // The save in flight reports back to this form
      KeyCode::Esc if self.submitting => return KeyResult::Handled,
      KeyCode::Esc => {
        self.close();
        return KeyResult::Event(FormEvent::Cancelled);
      }
      KeyCode::Tab | KeyCode::Down => {
        self.focus_next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus_previous();
        return KeyResult::Handled;
      }
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return self.submit();
      }
      KeyCode::Enter if self.focus + 1 < FIELDS.len() => {
        self.focus_next();
        return KeyResult::Handled;
      }
      KeyCode::Enter => return self.submit(),
      _ => {}
    }

    match self.inputs[self.focus].handle_key(key) {
      InputResult::Consumed => {
        self.error = None;
        KeyResult::Handled
      }
      // Form is modal
      _ => KeyResult::Handled,
    }
  }

  fn submit(&mut self) -> KeyResult<FormEvent> {
    if self.submitting {
      return KeyResult::Handled;
    }
    match self.submission() {
      Ok(write) => KeyResult::Event(FormEvent::Submit(write)),
      Err(e) => {
        self.error = Some(e);
        KeyResult::Handled
      }
    }
  }

  /// Render the form centered in `area` if open
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.open {
      return;
    }

    let width = 56.min(area.width);
    let height = (FIELDS.len() as u16 + 6).min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let title = if self.editing.is_some() {
      " Edit Course "
    } else {
      " Add New Course "
    };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Green))
      .title(title);

    let mut lines: Vec<Line> = FIELDS
      .iter()
      .enumerate()
      .map(|(i, field)| self.field_line(i, *field))
      .collect();

    lines.push(Line::raw(""));
    lines.push(match (self.error(), self.submitting) {
      (Some(e), _) => Line::styled(e.to_string(), Style::default().fg(Color::Red)),
      (None, true) => Line::styled("Saving...", Style::default().fg(Color::Yellow)),
      (None, false) => Line::raw(""),
    });

    let action = if self.editing.is_some() { "Update" } else { "Create" };
    lines.push(Line::from(vec![
      Span::styled("<Ctrl-s>", Style::default().fg(Color::Cyan)),
      Span::styled(format!(" {}   ", action), Style::default().fg(Color::DarkGray)),
      Span::styled("<Tab>", Style::default().fg(Color::Cyan)),
      Span::styled(" next   ", Style::default().fg(Color::DarkGray)),
      Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
      Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
  }

  fn field_line(&self, index: usize, field: Field) -> Line<'static> {
    let focused = index == self.focus;
    let input = &self.inputs[index];
    let marker = if field.required() { "*" } else { " " };

    let label_style = if focused {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::White)
    };

    let mut spans = vec![
      Span::styled(format!(" {:<13}{} ", field.label(), marker), label_style),
    ];

    if input.is_empty() && !focused {
      spans.push(Span::styled(
        field.placeholder(),
        Style::default().fg(Color::DarkGray),
      ));
    } else if focused {
      let (before, after): (String, String) = {
        let cursor = input.cursor_position();
        (
          input.value().chars().take(cursor).collect(),
          input.value().chars().skip(cursor).collect(),
        )
      };
      spans.push(Span::raw(before));
      spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      spans.push(Span::raw(after));
    } else {
      spans.push(Span::raw(input.value().to_string()));
    }

    if field == Field::Color {
      spans.push(Span::raw(" "));
      spans.push(Span::styled("  ", Style::default().bg(course_color(input.value()))));
    }

    Line::from(spans)
  }
}
