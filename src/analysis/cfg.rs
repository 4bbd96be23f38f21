//! Control-flow graph view of the statement tree.
//!
//! One node per statement plus synthetic entry and exit nodes. Edges carry
//! the executability computed by the engine; reachability is a DFS from the
//! entry that only follows executable edges.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeFiltered};

use super::{Analysis, Path};
use crate::ir::{Program, Stmt};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Entry,
    Exit,
    Stmt(Path),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// Fall through to the next statement.
    Seq,
    /// Into a loop or conditional body.
    Enter,
    /// From the end of a loop body back to its test.
    Back,
    /// Out of a loop.
    Exit,
    /// Past a conditional whose test failed.
    Skip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub executable: bool,
}

pub struct Cfg {
    pub graph: DiGraph<Node, Edge>,
    pub entry: NodeIndex,
    pub exit: NodeIndex,
    nodes: HashMap<Path, NodeIndex>,
}

impl Cfg {
    pub fn build(program: &Program, analysis: &Analysis) -> Self {
        let mut graph = DiGraph::new();
        let entry = graph.add_node(Node::Entry);
        let exit = graph.add_node(Node::Exit);
        let mut cfg = Cfg {
            graph,
            entry,
            exit,
            nodes: HashMap::new(),
        };
        let first = cfg.add_block(&program.body, &[], exit, EdgeKind::Seq, analysis);
        cfg.graph.add_edge(
            entry,
            first.unwrap_or(exit),
            Edge {
                kind: EdgeKind::Seq,
                executable: true,
            },
        );
        cfg
    }

    /// Add the nodes of `block`, wiring its last statement to `next`.
    /// Returns the node of the first statement.
    fn add_block(
        &mut self,
        block: &[Stmt],
        prefix: &[usize],
        next: NodeIndex,
        next_kind: EdgeKind,
        analysis: &Analysis,
    ) -> Option<NodeIndex> {
        let mut successor = next;
        let mut successor_kind = next_kind;
        for (i, stmt) in block.iter().enumerate().rev() {
            let mut path = prefix.to_vec();
            path.push(i);
            let node = self.graph.add_node(Node::Stmt(path.clone()));
            self.nodes.insert(path.clone(), node);
            let flags = analysis.edges(&path);
            match stmt {
                Stmt::Loop(body) => {
                    let first = self.add_block(body, &path, node, EdgeKind::Back, analysis);
                    self.link(node, first.unwrap_or(node), EdgeKind::Enter, flags.enter);
                    self.link(node, successor, EdgeKind::Exit, flags.exit);
                }
                Stmt::Conditional(body) => {
                    let first = self.add_block(body, &path, successor, successor_kind, analysis);
                    self.link(node, first.unwrap_or(successor), EdgeKind::Enter, flags.enter);
                    self.link(node, successor, EdgeKind::Skip, flags.exit);
                }
                Stmt::ZeroLoop | Stmt::ScanLoop(_) | Stmt::MultiplicationLoop { .. } => {
                    self.link(node, successor, EdgeKind::Exit, flags.exit);
                }
                _ => self.link(node, successor, successor_kind, true),
            }
            successor = node;
            successor_kind = EdgeKind::Seq;
        }
        (!block.is_empty()).then_some(successor)
    }

    fn link(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind, executable: bool) {
        self.graph.add_edge(from, to, Edge { kind, executable });
    }

    pub fn node(&self, path: &[usize]) -> Option<NodeIndex> {
        self.nodes.get(path).copied()
    }

    /// Paths of every statement reachable from the entry over executable
    /// edges.
    pub fn reachable(&self) -> HashSet<Path> {
        let filtered = EdgeFiltered::from_fn(&self.graph, |e| e.weight().executable);
        let mut dfs = Dfs::new(&filtered, self.entry);
        let mut out = HashSet::new();
        while let Some(index) = dfs.next(&filtered) {
            if let Node::Stmt(path) = &self.graph[index] {
                out.insert(path.clone());
            }
        }
        out
    }

    /// True if the program exit is reachable.
    pub fn exit_reachable(&self) -> bool {
        let filtered = EdgeFiltered::from_fn(&self.graph, |e| e.weight().executable);
        let mut dfs = Dfs::new(&filtered, self.entry);
        while let Some(index) = dfs.next(&filtered) {
            if index == self.exit {
                return true;
            }
        }
        false
    }
}
