use crate::graph::ErGraph;
use crate::interpret::{InterpretError, interpret};
use crate::notebook::Notebook;

/// Walks the notebook's code cells in order, interprets every line and
/// accumulates the recovered join structure: the three involved tables as
/// nodes, plus one `left -> result` and one `right -> result` edge, each
/// labeled with its side's join key.
///
/// A malformed join statement aborts the whole walk; the returned error
/// carries the statement text and the index of the cell it came from.
pub fn build_graph(notebook: &Notebook) -> Result<ErGraph, InterpretError> {
    let mut graph = ErGraph::default();

    for (num_cell, cell) in notebook.cells.iter().enumerate() {
        if !cell.is_code() {
            continue;
        }
        for stmt in cell.source.lines() {
            let Some(join) = interpret(stmt).map_err(|err| err.with_cell(num_cell))? else {
                continue;
            };
            log::debug!(
                "cell #{}: {} joins {} into {}",
                num_cell,
                join.left,
                join.right,
                join.result
            );

            graph.add_node(&join.left);
            graph.add_node(&join.right);
            graph.add_node(&join.result);
            graph.add_edge(&join.left, &join.result, join.left_key.as_deref());
            graph.add_edge(&join.right, &join.result, join.right_key.as_deref());
        }
    }

    Ok(graph)
}
