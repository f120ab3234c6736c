use resq_data::{Comparison, Direction, FilterValue, PageRequest, QueryTarget};

/// One mutation applied to a [`RecordingTarget`].
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOp {
    Compare(String, Comparison, FilterValue),
    In(String, Vec<FilterValue>),
    OrderBy(String, Direction),
    Paginate(PageRequest),
}

/// [`QueryTarget`] that records every mutation in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingTarget {
    pub ops: Vec<TargetOp>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orderings(&self) -> Vec<(String, Direction)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                TargetOp::OrderBy(field, dir) => Some((field.clone(), *dir)),
                _ => None,
            })
            .collect()
    }

    pub fn page(&self) -> Option<PageRequest> {
        self.ops.iter().rev().find_map(|op| match op {
            TargetOp::Paginate(page) => Some(*page),
            _ => None,
        })
    }
}

impl QueryTarget for RecordingTarget {
    fn where_cmp(&mut self, field: &str, op: Comparison, value: &FilterValue) {
        self.ops
            .push(TargetOp::Compare(field.to_string(), op, value.clone()));
    }

    fn where_in(&mut self, field: &str, values: &[FilterValue]) {
        self.ops.push(TargetOp::In(field.to_string(), values.to_vec()));
    }

    fn order_by(&mut self, field: &str, direction: Direction) {
        self.ops.push(TargetOp::OrderBy(field.to_string(), direction));
    }

    fn paginate(&mut self, page: &PageRequest) {
        self.ops.push(TargetOp::Paginate(*page));
    }
}
