use crate::model::{Entity, Field};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Table box metrics for the ER diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableMetrics {
    pub char_width: f64,
    pub padding_x: f64,
    pub header_height: f64,
    pub row_height: f64,
    pub footer_height: f64,
    pub min_table_width: f64,
}

impl Default for TableMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            padding_x: 10.0,
            header_height: 30.0,
            row_height: 25.0,
            footer_height: 10.0,
            min_table_width: 300.0,
        }
    }
}

impl TableMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        UnicodeWidthStr::width(text) as f64 * self.char_width
    }

    pub fn table_size(&self, entity: &Entity) -> (f64, f64) {
        let widest = entity
            .fields
            .iter()
            .map(|f| self.text_width(&field_label(f)))
            .fold(self.text_width(&entity.name), f64::max);

        let width = (widest + self.padding_x * 2.0).max(self.min_table_width);
        let height =
            self.header_height + entity.fields.len() as f64 * self.row_height + self.footer_height;

        (width, height)
    }
}

/// Row text for a field, e.g. `title: String!` or `tags: String[]`.
pub fn field_label(field: &Field) -> String {
    format!(
        "{}: {}{}{}",
        field.name,
        field.ty,
        if field.required { "!" } else { "" },
        if field.is_list { "[]" } else { "" }
    )
}
