//! Radix tree node.

use crate::error::RouteError;
use crate::method_table::MethodTable;
use crate::params::Params;
use http::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'p> {
    Static(&'p str),
    Param(&'p str),
}

/// One path segment in the tree.
///
/// Static children are kept sorted for binary search; a node has at most one
/// variable child.
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    segment: String,
    methods: MethodTable,
    static_children: Vec<Node>,
    param_child: Option<Box<Node>>,
    param_name: Option<String>,
}

impl Node {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    fn new_static(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    fn new_param(name: &str) -> Self {
        Self {
            segment: format!("{{{name}}}"),
            param_name: Some(name.to_string()),
            ..Self::default()
        }
    }

    fn parse_path(path: &str) -> Result<Vec<Segment<'_>>, RouteError> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    if name.is_empty() || name.contains(['{', '}']) {
                        return Err(RouteError::InvalidSegment {
                            path: path.to_string(),
                            segment: s.to_string(),
                        });
                    }
                    Ok(Segment::Param(name))
                } else if s.contains(['{', '}']) {
                    Err(RouteError::InvalidSegment {
                        path: path.to_string(),
                        segment: s.to_string(),
                    })
                } else {
                    Ok(Segment::Static(s))
                }
            })
            .collect()
    }

    pub(crate) fn insert(
        &mut self,
        method: &Method,
        path: &str,
        operation_id: &str,
    ) -> Result<(), RouteError> {
        let segments = Self::parse_path(path)?;
        let target = self.descend_or_create(path, &segments)?;
        target
            .methods
            .insert(method, operation_id)
            .map_err(|existing| RouteError::Duplicate {
                method: method.clone(),
                path: path.to_string(),
                existing: existing.to_string(),
            })
    }

    fn descend_or_create(
        &mut self,
        path: &str,
        segments: &[Segment<'_>],
    ) -> Result<&mut Node, RouteError> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(self);
        };

        match first {
            Segment::Static(segment) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new_static(segment));
                        index
                    }
                };
                self.static_children[index].descend_or_create(path, rest)
            }
            Segment::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new_param(name)));
                if let Some(existing) = child.param_name.as_deref() {
                    if existing != *name {
                        return Err(RouteError::ParamConflict {
                            path: path.to_string(),
                            name: (*name).to_string(),
                            existing: existing.to_string(),
                        });
                    }
                }
                child.descend_or_create(path, rest)
            }
        }
    }

    /// Finds the node for `path`, capturing variables along the way.
    pub(crate) fn match_path(&self, path: &str) -> Option<(&MethodTable, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a MethodTable> {
        let Some((segment, rest)) = segments.split_first() else {
            return (!self.methods.is_empty()).then_some(&self.methods);
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(rest, params) {
                return Some(found);
            }
        }

        let child = self.param_child.as_deref()?;
        let name = child.param_name.as_deref()?;
        let mark = params.len();
        params.push(name, *segment);
        let found = child.match_segments(rest, params);
        if found.is_none() {
            params.truncate(mark);
        }
        found
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
