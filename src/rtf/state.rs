//! Nested group state.
//!
//! Every `{ ... }` scope gets a frame that starts as a copy of its parent's
//! frame. Frames are plain values on a vector; the top frame is the scope
//! currently open.

use encoding_rs::Encoding;

/// Parser state for one RTF group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GroupState {
    /// Number of fallback bytes that follow a `\u` escape (`\ucN`)
    pub(crate) unicode_skip: u32,
    /// Charset of the font selected in this scope, if any
    pub(crate) font_charset: Option<&'static Encoding>,
    /// Inside `{\* ...}` or a non-content destination
    pub(crate) in_ignorable_destination: bool,
    /// Emitting literal HTML markup (`\htmltag`)
    pub(crate) in_html_tag: bool,
    /// Inside RTF-only formatting (`\htmlrtf`)
    pub(crate) in_html_rtf: bool,
    visible: bool,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            unicode_skip: 1,
            font_charset: None,
            in_ignorable_destination: false,
            in_html_tag: false,
            in_html_rtf: false,
            visible: true,
        }
    }
}

impl GroupState {
    /// State for a group nested inside `self`.
    ///
    /// `\htmltag` never carries over into a child scope.
    fn child(&self) -> Self {
        let mut state = Self {
            in_html_tag: false,
            ..*self
        };
        state.update_visibility();
        state
    }

    /// Whether text in this scope belongs to the output.
    #[inline]
    pub(crate) fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_ignorable(&mut self, ignorable: bool) {
        self.in_ignorable_destination = ignorable;
        self.update_visibility();
    }

    pub(crate) fn toggle_html_tag(&mut self) {
        self.in_html_tag = !self.in_html_tag;
        self.update_visibility();
    }

    pub(crate) fn set_html_rtf(&mut self, html_rtf: bool) {
        self.in_html_rtf = html_rtf;
        self.update_visibility();
    }

    fn update_visibility(&mut self) {
        self.visible =
            !((self.in_ignorable_destination && !self.in_html_tag) || self.in_html_rtf);
    }
}

/// Stack of group states.
///
/// The bottom frame stands for the text outside any group; the document is
/// open while at least one frame sits on top of it.
#[derive(Debug)]
pub(crate) struct GroupStack {
    frames: Vec<GroupState>,
}

impl GroupStack {
    pub(crate) fn new() -> Self {
        Self {
            frames: vec![GroupState::default()],
        }
    }

    /// Open a nested group.
    pub(crate) fn push(&mut self) {
        let child = self.current().child();
        self.frames.push(child);
    }

    /// Close the innermost group.
    ///
    /// Returns `true` when this closed the outermost group, i.e. the document.
    pub(crate) fn pop(&mut self) -> bool {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
        self.frames.len() == 1
    }

    /// Number of open groups.
    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    #[inline]
    pub(crate) fn current(&self) -> &GroupState {
        // The bottom frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    #[inline]
    pub(crate) fn current_mut(&mut self) -> &mut GroupState {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_rules() {
        let mut state = GroupState::default();
        assert!(state.is_visible());

        state.set_ignorable(true);
        assert!(!state.is_visible());

        state.toggle_html_tag();
        assert!(state.is_visible());

        state.set_html_rtf(true);
        assert!(!state.is_visible());

        state.set_html_rtf(false);
        state.toggle_html_tag();
        assert!(!state.is_visible());
    }

    #[test]
    fn test_child_inherits_but_resets_html_tag() {
        let mut stack = GroupStack::new();
        stack.push();
        {
            let state = stack.current_mut();
            state.unicode_skip = 2;
            state.font_charset = Some(encoding_rs::WINDOWS_1251);
            state.set_ignorable(true);
            state.toggle_html_tag();
        }
        assert!(stack.current().is_visible());

        stack.push();
        let child = stack.current();
        assert_eq!(child.unicode_skip, 2);
        assert_eq!(child.font_charset, Some(encoding_rs::WINDOWS_1251));
        assert!(child.in_ignorable_destination);
        assert!(!child.in_html_tag);
        assert!(!child.is_visible());
    }

    #[test]
    fn test_pop_restores_parent() {
        let mut stack = GroupStack::new();
        stack.push();
        stack.push();
        stack.current_mut().set_html_rtf(true);
        assert_eq!(stack.depth(), 2);

        assert!(!stack.pop());
        assert!(stack.current().is_visible());
        assert!(stack.pop());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_pop_on_empty_stack_ends_document() {
        let mut stack = GroupStack::new();
        assert!(stack.pop());
        assert_eq!(stack.depth(), 0);
    }
}
