use decaf_backend::alloc::{Coloring, Interference};
use decaf_common::tac::{Assignment, LocationId, Locations};

/// An interference graph in GraphViz form. Every node is labelled with its
/// name and where it ended up.
pub struct GraphViz<'a> {
    locations: &'a Locations,
    graph: &'a Interference,
    coloring: &'a Coloring,
}

impl<'a> GraphViz<'a> {
    pub fn new(locations: &'a Locations, graph: &'a Interference, coloring: &'a Coloring) -> Self {
        Self {
            locations,
            graph,
            coloring,
        }
    }

    pub fn render<W: std::io::Write>(&self, output: &mut W) -> dot2::Result {
        dot2::render(self, output)
    }
}

impl<'a> dot2::Labeller<'a> for GraphViz<'a> {
    type Node = LocationId;
    type Edge = (LocationId, LocationId);
    type Subgraph = ();

    fn graph_id(&'a self) -> dot2::Result<dot2::Id<'a>> {
        dot2::Id::new("interference")
    }

    fn node_id(&'a self, n: &Self::Node) -> dot2::Result<dot2::Id<'a>> {
        dot2::Id::new(format!("N{}", n.index()))
    }

    fn node_label(&'a self, n: &Self::Node) -> dot2::Result<dot2::label::Text<'a>> {
        let name = self.locations.name(n);
        let label = match self.coloring.assignments.get(n) {
            Some(Assignment::Register(reg)) => format!("{name} (${})", reg.0),
            Some(Assignment::Memory) => format!("{name} (memory)"),
            None => name.to_string(),
        };

        Ok(dot2::label::Text::LabelStr(label.into()))
    }

    fn kind(&self) -> dot2::Kind {
        dot2::Kind::Graph
    }
}

impl<'a> dot2::GraphWalk<'a> for GraphViz<'a> {
    type Node = LocationId;
    type Edge = (LocationId, LocationId);
    type Subgraph = ();

    fn nodes(&'a self) -> dot2::Nodes<'a, Self::Node> {
        self.graph.nodes().collect::<Vec<_>>().into()
    }

    fn edges(&'a self) -> dot2::Edges<'a, Self::Edge> {
        self.graph.edges().collect::<Vec<_>>().into()
    }

    fn source(&'a self, edge: &Self::Edge) -> Self::Node {
        edge.0
    }

    fn target(&'a self, edge: &Self::Edge) -> Self::Node {
        edge.1
    }
}
