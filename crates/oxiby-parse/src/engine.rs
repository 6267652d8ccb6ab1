use oxiby_errors::Diagnostic;
use oxiby_language::{Action, Language};
use oxiby_lexer::{Lexer, Token};
use oxiby_tree::{NodeId, SyntaxTree, TreeBuilder};
use text_size::{TextRange, TextSize};

pub(crate) fn run(language: &Language, text: &str) -> SyntaxTree {
    Engine::new(language, text).run()
}

/// One entry of the fused state/value stack.
struct Frame {
    state: u32,
    /// Nodes this frame contributes, in order. More than one after a hidden
    /// rule spliced its children; empty for an empty production.
    nodes: Vec<NodeId>,
    /// Recovery leftovers positioned after `nodes`. Wrapped into an `ERROR`
    /// node when the frame is consumed.
    orphans: Vec<NodeId>,
}

impl Frame {
    fn new(state: u32, nodes: Vec<NodeId>) -> Self {
        Self { state, nodes, orphans: Vec::new() }
    }
}

struct Engine<'a> {
    language: &'a Language,
    text: &'a str,
    lexer: Lexer<'a>,
    builder: TreeBuilder,
    stack: Vec<Frame>,
    lookahead: Token,
    /// Set while skipping a run of unexpected tokens; keeps the run under a
    /// single diagnostic.
    recovering: bool,
    eof_reported: bool,
}

impl<'a> Engine<'a> {
    fn new(language: &'a Language, text: &'a str) -> Self {
        let mut lexer = Lexer::new(language, text);
        let lookahead = lexer.next_token();
        Self {
            language,
            text,
            lexer,
            builder: TreeBuilder::new(language.clone(), text),
            stack: vec![Frame::new(0, Vec::new())],
            lookahead,
            recovering: false,
            eof_reported: false,
        }
    }

    fn run(mut self) -> SyntaxTree {
        loop {
            let state = self.state();
            match self.language.raw().state(state).action(self.lookahead.kind) {
                Some(Action::Shift(target)) => self.shift(target),
                Some(Action::Reduce(production)) => self.reduce(production),
                Some(Action::Accept) => break,
                None => {
                    if !self.recover() {
                        break;
                    }
                }
            }
        }
        self.assemble()
    }

    fn state(&self) -> u32 {
        self.stack.last().map_or(0, |frame| frame.state)
    }

    fn shift(&mut self, target: u32) {
        let token = self.lookahead;
        let node = self.token_node(token);
        self.stack.push(Frame::new(target, vec![node]));
        self.recovering = false;
        self.lookahead = self.lexer.next_token();
    }

    fn reduce(&mut self, production: u32) {
        let prod = self.language.raw().production(production).clone();
        let split = self.stack.len().saturating_sub(prod.rhs.len()).max(1);
        let popped = self.stack.split_off(split);

        let mut children = Vec::with_capacity(prod.rhs.len());
        for (slot, frame) in popped.into_iter().enumerate() {
            if let Some(field) = prod.fields.get(slot).copied().flatten() {
                for &node in &frame.nodes {
                    self.builder.set_field(node, field);
                }
            }
            children.extend(frame.nodes);
            if !frame.orphans.is_empty() {
                let error = self.builder.error(&frame.orphans);
                children.push(error);
            }
        }

        let nodes = if self.language.is_hidden(prod.lhs) {
            children
        } else {
            vec![self.builder.node(prod.lhs, &children)]
        };

        let state = self.state();
        match self.language.raw().state(state).goto(prod.lhs) {
            Some(target) => self.stack.push(Frame::new(target, nodes)),
            // No goto for a reduced symbol means the tables are corrupt;
            // park the subtree for recovery rather than lose it.
            None => self.park(nodes),
        }
        self.recovering = false;
    }

    /// Consumes the minimal problematic span: skip the offending token, or at
    /// end of input demote the unfinished top frame. Returns `false` when
    /// nothing is left to try and the engine should assemble what it has.
    fn recover(&mut self) -> bool {
        if self.lookahead.is_end() {
            self.report_eof();
            if self.stack.len() <= 1 {
                return false;
            }
            let Some(frame) = self.stack.pop() else { return false };
            self.park(frame.nodes);
            self.park(frame.orphans);
            true
        } else {
            let token = self.lookahead;
            let node = self.token_node(token);
            self.park(vec![node]);
            self.report_skip(token);
            self.lookahead = self.lexer.next_token();
            true
        }
    }

    /// Appends nodes to the current frame's recovery buffer.
    fn park(&mut self, nodes: Vec<NodeId>) {
        if let Some(frame) = self.stack.last_mut() {
            frame.orphans.extend(nodes);
        }
    }

    fn token_node(&mut self, token: Token) -> NodeId {
        self.builder.token(token.kind, token.range, token.leading_len, token.trailing_len)
    }

    fn report_skip(&mut self, token: Token) {
        if self.recovering {
            if let Some(diagnostic) = self.builder.last_diagnostic_mut() {
                diagnostic.extend_to(token.range.end());
            }
            return;
        }
        self.recovering = true;
        let message = format!("unexpected token `{}`", &self.text[token.range]);
        self.builder.push_diagnostic(Diagnostic::error(message, token.range));
    }

    fn report_eof(&mut self) {
        if self.eof_reported {
            return;
        }
        self.eof_reported = true;
        let end = TextRange::empty(TextSize::of(self.text));
        self.builder.push_diagnostic(Diagnostic::error("unexpected end of input", end));
    }

    /// Builds the final root from whatever the stack holds. On the accept
    /// path that is the finished root node; after recovery it may also hold
    /// parked leftovers, which wrap into `ERROR` nodes around (or inside) a
    /// rebuilt root.
    fn assemble(mut self) -> SyntaxTree {
        let root_symbol = self.language.root_symbol();
        let frames = std::mem::take(&mut self.stack);

        let mut content = Vec::new();
        for frame in frames {
            content.extend(frame.nodes);
            if !frame.orphans.is_empty() {
                let error = self.builder.error(&frame.orphans);
                content.push(error);
            }
        }

        let root = if content.len() == 1 && self.builder.kind_of(content[0]) == root_symbol {
            content[0]
        } else {
            let mut children = Vec::new();
            for node in content {
                if self.builder.kind_of(node) == root_symbol {
                    children.extend(self.builder.children_of(node));
                } else {
                    children.push(node);
                }
            }
            self.builder.node(root_symbol, &children)
        };
        self.builder.finish(root)
    }
}
