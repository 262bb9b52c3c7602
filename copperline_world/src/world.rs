// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The world façade: keeps the revision tree, spatial index, and joint
//! graph consistent and answers collision and assembly queries.

use alloc::vec::Vec;

use copperline_geom::{BBox, LayerRange, LineChain, VecI};
use copperline_index::ShapeIndex;
use hashbrown::HashSet;
use log::trace;

use crate::arena::{ItemArena, ItemId};
use crate::item::{BoardRef, Item, ItemKind, Line, Marker};
use crate::joint::{Joint, JointLink, JointMap, JointTag};
use crate::revision::{ChangeSet, RevisionId, RevisionPath, RevisionTree, path};
use crate::rules::{DEFAULT_CLEARANCE, DefaultRules, RuleResolver};

/// Default bounding-region expansion radius for index queries, in
/// nanometres. An upper bound on any clearance the rules can return.
pub const DEFAULT_MAX_CLEARANCE: i32 = 800_000;

/// A query probe: either a persistent-style item (possibly transient) or a
/// whole assembled line.
#[derive(Copy, Clone, Debug)]
pub enum Probe<'a> {
    /// A single item.
    Item(&'a Item),
    /// An assembled line; collisions test every sub-segment.
    Line(&'a Line),
}

impl<'a> From<&'a Item> for Probe<'a> {
    fn from(item: &'a Item) -> Self {
        Self::Item(item)
    }
}

impl<'a> From<&'a Line> for Probe<'a> {
    fn from(line: &'a Line) -> Self {
        Self::Line(line)
    }
}

impl Probe<'_> {
    fn bbox(&self) -> BBox {
        match self {
            Self::Item(item) => item.bbox(),
            Self::Line(line) => line.bbox(),
        }
    }

    // Lines widen the clearance by their half-width; their sub-segment
    // outlines are centrelines as far as the rules are concerned.
    fn extra_clearance(&self) -> i32 {
        match self {
            Self::Item(_) => 0,
            Self::Line(line) => line.width() / 2,
        }
    }

    // A stand-in item for rule lookups; a line is represented by its first
    // sub-segment.
    fn rule_item(&self) -> Option<Item> {
        match self {
            Self::Item(item) => Some((*item).clone()),
            Self::Line(line) => (line.segment_count() > 0).then(|| line.probe_segment(0)),
        }
    }

    fn collide(&self, cand: &Item, clearance: i32, different_nets_only: bool) -> bool {
        match self {
            Self::Item(item) => cand.collide(item, clearance, different_nets_only),
            Self::Line(line) => line.collide_with_item(cand, clearance, different_nets_only),
        }
    }
}

/// One collision found by a query.
#[derive(Clone, Debug)]
pub struct Obstacle {
    /// The colliding item in the world.
    pub item: ItemId,
    /// Copy of the probing item; `None` when the probe was a whole line
    /// (the caller still holds it).
    pub head: Option<Item>,
    /// Nearest hull intersection along the probed line.
    pub ip_first: Option<VecI>,
    /// Farthest hull intersection along the probed line.
    pub ip_last: Option<VecI>,
    /// Path distance of `ip_first`.
    pub dist_first: i64,
    /// Path distance of `ip_last`.
    pub dist_last: i64,
    /// Clearance hull of the obstacle, when computed.
    pub hull: Option<LineChain>,
}

impl Obstacle {
    fn new(item: ItemId, head: Option<Item>) -> Self {
        Self {
            item,
            head,
            ip_first: None,
            ip_last: None,
            dist_first: i64::MAX,
            dist_last: i64::MIN,
            hull: None,
        }
    }
}

/// The spatial world model.
///
/// Owns the item arena, the revision tree, the spatial index, and the joint
/// map, and keeps the latter two mirroring the checked-out revision across
/// every mutation and every revision-tree navigation.
///
/// A single logical agent drives a world; operations are synchronous and
/// immediately visible to the next call.
#[derive(Debug)]
pub struct World<R: RuleResolver = DefaultRules> {
    items: ItemArena,
    revisions: RevisionTree,
    current: RevisionId,
    index: ShapeIndex<ItemId>,
    joints: JointMap,
    max_clearance: i32,
    rules: R,
}

impl Default for World<DefaultRules> {
    fn default() -> Self {
        Self::new()
    }
}

impl World<DefaultRules> {
    /// Create an empty world with the constant default rules.
    pub fn new() -> Self {
        Self::with_rules(DefaultRules)
    }
}

impl<R: RuleResolver> World<R> {
    /// Create an empty world with the given rule resolver.
    pub fn with_rules(rules: R) -> Self {
        let revisions = RevisionTree::new();
        let current = revisions.root();
        Self {
            items: ItemArena::new(),
            revisions,
            current,
            index: ShapeIndex::new(),
            joints: JointMap::new(),
            max_clearance: DEFAULT_MAX_CLEARANCE,
            rules,
        }
    }

    // ----- accessors -----

    /// The checked-out revision.
    pub fn revision(&self) -> RevisionId {
        self.current
    }

    /// The revision tree.
    pub fn revision_tree(&self) -> &RevisionTree {
        &self.revisions
    }

    /// Borrow an item; panics on a stale id.
    pub fn item(&self, id: ItemId) -> &Item {
        self.items.item(id)
    }

    /// Whether `id` refers to a live item.
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains(id)
    }

    /// Number of items visible in the checked-out revision.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no items are visible.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The index-query expansion radius.
    pub fn max_clearance(&self) -> i32 {
        self.max_clearance
    }

    /// Set the index-query expansion radius. Must stay an upper bound on
    /// everything the rules return.
    pub fn set_max_clearance(&mut self, radius: i32) {
        self.max_clearance = radius;
    }

    /// Required clearance between two items per the configured rules.
    pub fn clearance(&self, a: &Item, b: &Item) -> i32 {
        self.rules.clearance(a, b)
    }

    /// Iterate every item visible in the checked-out revision.
    pub fn indexed_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.index.iter()
    }

    /// The joint graph.
    pub fn joint_map(&self) -> &JointMap {
        &self.joints
    }

    // ----- mutations -----

    /// Add a solid obstacle. Panics unless the item is a solid.
    pub fn add_solid(&mut self, solid: Item) -> ItemId {
        assert!(solid.kind() == ItemKind::SOLID);
        self.record_add(solid)
    }

    /// Add a via. Panics unless the item is a via.
    pub fn add_via(&mut self, via: Item) -> ItemId {
        assert!(via.kind() == ItemKind::VIA);
        self.record_add(via)
    }

    /// Add a wire segment. Panics unless the item is a segment.
    ///
    /// Zero-length segments are dropped, as are duplicates of an existing
    /// segment (same unordered endpoints, start layer, and net) unless
    /// `allow_redundant` is set. Returns the id when the segment went in.
    pub fn add_segment(&mut self, segment: Item, allow_redundant: bool) -> Option<ItemId> {
        assert!(segment.kind() == ItemKind::SEGMENT);
        let seg = segment.seg();
        if seg.a == seg.b {
            trace!("attempting to add a segment with the same end coordinates, ignoring");
            return None;
        }
        if !allow_redundant
            && self
                .find_redundant_segment(seg.a, seg.b, segment.layers(), segment.net())
                .is_some()
        {
            trace!("dropping a redundant segment");
            return None;
        }
        Some(self.record_add(segment))
    }

    /// Add a line: split it into segments and insert each one.
    ///
    /// A sub-segment that duplicates an existing segment is shared (the
    /// line links the existing item) instead of inserted, unless
    /// `allow_redundant` is set. The line ends owned by the current
    /// revision. Panics if the line is already linked.
    pub fn add_line(&mut self, line: &mut Line, allow_redundant: bool) {
        assert!(!line.is_linked());
        for i in 0..line.segment_count() {
            let s = line.seg(i);
            if s.a == s.b {
                continue;
            }
            if !allow_redundant
                && let Some(existing) =
                    self.find_redundant_segment(s.a, s.b, line.layers(), line.net())
            {
                // Another line may reference that segment too; share it.
                line.link_segment(existing);
            } else {
                let id = self.record_add(line.probe_segment(i));
                line.link_segment(id);
            }
        }
        line.set_owner(Some(self.current));
    }

    /// Remove a persistent item, shadowing or cancelling it in the current
    /// revision. Panics on a stale id.
    pub fn remove(&mut self, id: ItemId) {
        self.remove_index(id);
        self.revisions.remove_item(self.current, id, &mut self.items);
    }

    /// Remove every segment a line links, then detach the line.
    ///
    /// Lines have no remover of their own; they are never members of the
    /// world.
    pub fn remove_line(&mut self, line: &mut Line) {
        let links: Vec<ItemId> = line.linked_segments().to_vec();
        for id in links {
            self.remove(id);
        }
        line.set_owner(None);
        line.clear_links();
    }

    /// Remove `old` and add `new` in its place.
    ///
    /// Returns the new id, or `None` when the replacement was dropped as
    /// degenerate or redundant.
    pub fn replace(&mut self, old: ItemId, new: Item) -> Option<ItemId> {
        self.remove(old);
        match new.kind() {
            ItemKind::SOLID => Some(self.add_solid(new)),
            ItemKind::VIA => Some(self.add_via(new)),
            ItemKind::SEGMENT => self.add_segment(new, false),
            _ => panic!("lines are replaced with replace_line"),
        }
    }

    /// Replace one line with another.
    pub fn replace_line(&mut self, old: &mut Line, new: &mut Line) {
        self.remove_line(old);
        self.add_line(new, false);
    }

    // ----- revision navigation -----

    /// Branch the current revision, check out the branch, and return the
    /// previous revision.
    pub fn branch_move(&mut self) -> RevisionId {
        let prev = self.current;
        self.current = self.revisions.branch(prev);
        prev
    }

    /// Squash the current revision into its parent and check out the
    /// parent. The index and joints are untouched: the merged delta spans
    /// the same visible state.
    pub fn squash(&mut self) {
        self.current = self.revisions.squash(self.current, &mut self.items);
    }

    /// Squash until the current revision is `ancestor`.
    pub fn squash_to(&mut self, ancestor: RevisionId) {
        while self.current != ancestor {
            self.squash();
        }
    }

    /// Squash until the current revision is a direct child of `ancestor`.
    pub fn squash_to_parent(&mut self, ancestor: RevisionId) {
        while self.revisions.parent(self.current) != Some(ancestor) {
            self.squash();
        }
    }

    /// Roll back the current revision: undo its delta on the index and
    /// joints, destroy it, and check out the parent.
    pub fn revert(&mut self) {
        self.undo_revision(self.current);
        self.current = self.revisions.revert(self.current, &mut self.items);
    }

    /// Revert until the current revision is `ancestor`.
    pub fn revert_to(&mut self, ancestor: RevisionId) {
        while self.current != ancestor {
            self.revert();
        }
    }

    /// Revert until the current revision is a direct child of `ancestor`.
    pub fn revert_to_parent(&mut self, ancestor: RevisionId) {
        while self.revisions.parent(self.current) != Some(ancestor) {
            self.revert();
        }
    }

    /// Check out an arbitrary revision of the tree, replaying deltas along
    /// the connecting path.
    pub fn checkout(&mut self, target: RevisionId) {
        let p = path(&self.revisions, self.current, target);
        self.walk_path(&p);
    }

    /// Walk a path: undo the revert list, then replay the apply list.
    ///
    /// Panics if the path is not anchored at the current revision.
    pub fn walk_path(&mut self, path: &RevisionPath) {
        for rev in path.revert() {
            assert!(*rev == self.current, "path does not start at the current revision");
            self.undo_revision(*rev);
            self.current = self
                .revisions
                .parent(*rev)
                .expect("reverting the root revision");
        }
        for rev in path.apply() {
            assert!(
                self.revisions.parent(*rev) == Some(self.current),
                "apply list does not descend from the current revision"
            );
            self.apply_revision(*rev);
            self.current = *rev;
        }
    }

    /// Drop all branches of the current revision and the items they own.
    pub fn clear_branches(&mut self) {
        self.revisions.clear_branches(self.current, &mut self.items);
    }

    /// Summarise the current revision's delta.
    pub fn revision_changes(&self) -> ChangeSet {
        let mut set = ChangeSet::new();
        set.apply(&self.revisions, self.current);
        set
    }

    /// Path from the current revision up to `ancestor`.
    pub fn path_to(&self, ancestor: RevisionId) -> RevisionPath {
        self.revisions.path_to_ancestor(self.current, ancestor)
    }

    /// Wipe the index, the joints, and the current revision's delta and
    /// branches.
    pub fn clear(&mut self) {
        self.index.clear();
        self.joints.clear();
        self.revisions.clear_revision(self.current, &mut self.items);
    }

    // ----- queries -----

    /// Collect items colliding with the probe.
    ///
    /// The index is queried with the probe's box expanded by the
    /// max-clearance radius; candidates are filtered by `kind_mask` and
    /// refined geometrically at the rule clearance (or `force_clearance`
    /// when given). Stops after `limit` hits when set. Returns the number
    /// of obstacles appended.
    pub fn query_colliding<'a>(
        &self,
        probe: impl Into<Probe<'a>>,
        obstacles: &mut Vec<Obstacle>,
        kind_mask: ItemKind,
        limit: Option<usize>,
        different_nets_only: bool,
        force_clearance: Option<i32>,
    ) -> usize {
        let probe = probe.into();
        let extra = probe.extra_clearance();
        let rule_probe = probe.rule_item();
        let qbox = probe.bbox().inflated(self.max_clearance);
        let items = &self.items;
        let rules = &self.rules;
        let mut matches = 0_usize;
        self.index.query(qbox, |cand_id| {
            let cand = items.item(cand_id);
            if !cand.of_kind(kind_mask) {
                return true;
            }
            let clearance = force_clearance.unwrap_or_else(|| {
                extra
                    + rule_probe
                        .as_ref()
                        .map(|p| rules.clearance(cand, p))
                        .unwrap_or(DEFAULT_CLEARANCE)
            });
            if !probe.collide(cand, clearance, different_nets_only) {
                return true;
            }
            let head = match probe {
                Probe::Item(item) => Some(item.clone()),
                Probe::Line(_) => None,
            };
            obstacles.push(Obstacle::new(cand_id, head));
            matches += 1;
            limit.is_none_or(|l| matches < l)
        });
        matches
    }

    /// The first obstacle along a line, by path distance.
    ///
    /// Every sub-segment (and the end via, if present) is queried; for each
    /// obstacle the intersections of its clearance hull with the line's
    /// centreline (and with the via's hull) are ranked by distance along
    /// the line. Ties keep the first obstacle found. When candidates exist
    /// but no hull intersection does (the hull swallows the line whole),
    /// the first candidate is returned without geometry.
    pub fn nearest_obstacle(
        &self,
        line: &Line,
        kind_mask: ItemKind,
        restricted: Option<&HashSet<ItemId>>,
    ) -> Option<Obstacle> {
        let mut obs_list = Vec::new();
        let mut n = 0_usize;
        for i in 0..line.segment_count() {
            let probe = line.probe_segment(i);
            n += self.query_colliding(&probe, &mut obs_list, kind_mask, None, true, None);
        }
        if let Some(via) = line.via() {
            n += self.query_colliding(via, &mut obs_list, kind_mask, None, true, None);
        }
        if n == 0 {
            return None;
        }

        // Rule lookups represent the line by its first sub-segment; a
        // via-only stub falls back to the via itself.
        let rule_line = if line.segment_count() > 0 {
            line.probe_segment(0)
        } else {
            line.via().expect("candidates imply a segment or a via").clone()
        };
        let mut nearest = Obstacle::new(obs_list[0].item, None);
        let mut found_isects = false;

        for obs in &obs_list {
            if restricted.is_some_and(|set| !set.contains(&obs.item)) {
                continue;
            }
            let cand = self.items.item(obs.item);
            let clearance = self.rules.clearance(cand, &rule_line);
            let hull = cand.hull(clearance, line.width());

            if let Some(via) = line.via() {
                let via_clearance = self.rules.clearance(cand, via);
                let via_hull = via.hull(via_clearance, line.width());
                for p in via_hull.intersect(&hull) {
                    let dist = line.chain().length() + (p - via.pos()).length();
                    if dist < nearest.dist_first {
                        found_isects = true;
                        nearest.dist_first = dist;
                        nearest.ip_first = Some(p);
                        nearest.item = obs.item;
                        nearest.hull = Some(hull.clone());
                    }
                    if dist > nearest.dist_last {
                        nearest.dist_last = dist;
                        nearest.ip_last = Some(p);
                    }
                }
            }

            for p in hull.intersect(line.chain()) {
                let dist = line.chain().path_length(p);
                if dist < nearest.dist_first {
                    found_isects = true;
                    nearest.dist_first = dist;
                    nearest.ip_first = Some(p);
                    nearest.item = obs.item;
                    nearest.hull = Some(hull.clone());
                }
                if dist > nearest.dist_last {
                    nearest.dist_last = dist;
                    nearest.ip_last = Some(p);
                }
            }
        }

        if !found_isects {
            nearest = Obstacle::new(obs_list[0].item, obs_list[0].head.clone());
        }
        Some(nearest)
    }

    /// The first collision for the probe, or `None`.
    ///
    /// A line probe tests each sub-segment (and the end via) in order and
    /// returns the first hit.
    pub fn check_colliding<'a>(
        &self,
        probe: impl Into<Probe<'a>>,
        kind_mask: ItemKind,
    ) -> Option<Obstacle> {
        let probe = probe.into();
        let mut obs = Vec::new();
        match probe {
            Probe::Line(line) => {
                for i in 0..line.segment_count() {
                    let s = line.probe_segment(i);
                    if self.query_colliding(&s, &mut obs, kind_mask, Some(1), true, None) > 0 {
                        return obs.pop();
                    }
                }
                if let Some(via) = line.via()
                    && self.query_colliding(via, &mut obs, kind_mask, Some(1), true, None) > 0
                {
                    return obs.pop();
                }
                None
            }
            Probe::Item(_) => {
                if self.query_colliding(probe, &mut obs, kind_mask, Some(1), true, None) > 0 {
                    obs.pop()
                } else {
                    None
                }
            }
        }
    }

    /// Whether two probes collide at the rule (or forced) clearance,
    /// widened by the half-width of any line involved.
    pub fn check_colliding_pair<'a, 'b>(
        &self,
        a: impl Into<Probe<'a>>,
        b: impl Into<Probe<'b>>,
        kind_mask: ItemKind,
        force_clearance: Option<i32>,
    ) -> bool {
        let a = a.into();
        let b = b.into();
        let b_kind = match b {
            Probe::Item(item) => item.kind(),
            Probe::Line(_) => ItemKind::LINE,
        };
        if !kind_mask.contains(b_kind) {
            return false;
        }
        let mut clearance = force_clearance.unwrap_or_else(|| {
            match (a.rule_item(), b.rule_item()) {
                (Some(x), Some(y)) => self.rules.clearance(&x, &y),
                _ => DEFAULT_CLEARANCE,
            }
        });
        if let Probe::Line(line) = a {
            clearance += line.width() / 2;
        }
        if let Probe::Line(line) = b {
            clearance += line.width() / 2;
        }
        match (a, b) {
            (Probe::Item(x), Probe::Item(y)) => x.collide(y, clearance, true),
            (Probe::Item(x), Probe::Line(l)) | (Probe::Line(l), Probe::Item(x)) => {
                x.collide_with_line(l, clearance, true)
            }
            (Probe::Line(x), Probe::Line(y)) => (0..x.segment_count())
                .any(|i| x.probe_segment(i).collide_with_line(y, clearance, true)),
        }
    }

    /// Items whose outline contains the point.
    pub fn hit_test(&self, p: VecI) -> Vec<ItemId> {
        let mut out = Vec::new();
        let items = &self.items;
        let qbox = BBox::from_point(p).inflated(self.max_clearance);
        self.index.query(qbox, |id| {
            if items.item(id).shape().contains_point(p) {
                out.push(id);
            }
            true
        });
        out
    }

    /// The item created from a given board item, if present.
    pub fn find_item_by_parent(&self, parent: BoardRef) -> Option<ItemId> {
        self.index
            .items_for_net(parent.net)
            .iter()
            .copied()
            .find(|id| self.items.item(*id).parent() == Some(parent))
    }

    /// All visible items of a net.
    pub fn all_items_in_net(&self, net: i32) -> &[ItemId] {
        self.index.items_for_net(net)
    }

    // ----- joints -----

    /// First joint at (pos, net) covering `layer`.
    pub fn find_joint(&self, pos: VecI, layer: i32, net: i32) -> Option<&Joint> {
        self.joints.find(pos, layer, net)
    }

    /// Joint at a position for a given item's start layer and net.
    pub fn find_joint_for_item(&self, pos: VecI, item: ItemId) -> Option<&Joint> {
        let item = self.items.item(item);
        self.joints.find(pos, item.layers().start(), item.net())
    }

    /// Touch-or-create the joint at `pos` for the item's layers and net,
    /// and set its locked flag.
    pub fn lock_joint(&mut self, pos: VecI, item: ItemId, locked: bool) {
        let (layers, net) = {
            let item = self.items.item(item);
            (item.layers(), item.net())
        };
        self.joints.lock(pos, layers, net, locked);
    }

    /// The segment sharing (unordered endpoints, start layer, net) with the
    /// given coordinates, if one is linked at `a`.
    pub fn find_redundant_segment(
        &self,
        a: VecI,
        b: VecI,
        layers: LayerRange,
        net: i32,
    ) -> Option<ItemId> {
        let joint = self.joints.find(a, layers.start(), net)?;
        for link in joint.links() {
            if link.kind != ItemKind::SEGMENT {
                continue;
            }
            let other = self.items.item(link.id);
            let s = other.seg();
            if other.layers().start() == layers.start()
                && ((a == s.a && b == s.b) || (a == s.b && b == s.a))
            {
                return Some(link.id);
            }
        }
        None
    }

    // ----- line assembly -----

    /// Assemble the full line passing through `seed`.
    ///
    /// Walks the joint graph in both directions from the seed segment,
    /// passing through line corners and stopping at locked joints when
    /// `stop_at_locked` is set. A loop guard terminates closed loops. The
    /// seed is always part of the result; `origin_index` receives its
    /// position among the linked segments.
    pub fn assemble_line(
        &self,
        seed: ItemId,
        mut origin_index: Option<&mut usize>,
        stop_at_locked: bool,
    ) -> Line {
        let seed_item = self.items.item(seed);
        let mut line = Line::new(seed_item.width(), seed_item.layers(), seed_item.net());
        line.set_owner(Some(self.current));

        let (mut cells, guard_hit) = self.follow_line(seed, false, stop_at_locked);
        cells.reverse();
        if !guard_hit {
            cells.extend(self.follow_line(seed, true, stop_at_locked).0);
        }

        let mut n = 0_usize;
        for (corner, seg) in cells {
            line.append_point(corner);
            // A closed loop revisits the seed at the guard cell; every
            // segment is linked exactly once.
            if !line.linked_segments().contains(&seg) {
                line.link_segment(seg);
                if seg == seed
                    && let Some(out) = origin_index.as_deref_mut()
                {
                    *out = n;
                }
                n += 1;
            }
        }

        assert!(line.segment_count() != 0);
        line
    }

    /// The joints at a line's first and last corners.
    pub fn find_line_ends(&self, line: &Line) -> (Joint, Joint) {
        let start = self
            .joints
            .find(line.point(0), line.layers().start(), line.net())
            .expect("line start has a joint");
        let end = self
            .joints
            .find(
                line.chain().last_point(),
                line.layers().start(),
                line.net(),
            )
            .expect("line end has a joint");
        (start.clone(), end.clone())
    }

    /// All lines running between two joints, clipped to the span between
    /// them.
    pub fn find_lines_between_joints(&self, a: &Joint, b: &Joint) -> Vec<Line> {
        let mut out = Vec::new();
        for link in a.links() {
            if link.kind != ItemKind::SEGMENT {
                continue;
            }
            let mut line = self.assemble_line(link.id, None, false);
            if !line.layers().overlaps(&b.layers()) {
                continue;
            }
            let id_start = line.chain().find(a.pos());
            let id_end = line.chain().find(b.pos());
            if let (Some(mut s), Some(mut e)) = (id_start, id_end) {
                if e < s {
                    core::mem::swap(&mut s, &mut e);
                }
                line.clip_vertex_range(s, e);
                out.push(line);
            }
        }
        out
    }

    // ----- marker helpers -----

    /// Set an item's marker bits. Markers belong to the router; the world
    /// only stores them.
    pub fn set_marker(&mut self, id: ItemId, marker: Marker) {
        self.items.item_mut(id).set_marker(marker);
    }

    /// Set an item's rank.
    pub fn set_rank(&mut self, id: ItemId, rank: i32) {
        self.items.item_mut(id).set_rank(rank);
    }

    /// Reset every indexed item's rank to −1 and clear the masked marker
    /// bits.
    pub fn clear_ranks(&mut self, marker_mask: Marker) {
        let ids: Vec<ItemId> = self.index.iter().collect();
        for id in ids {
            let item = self.items.item_mut(id);
            item.set_rank(-1);
            let marker = item.marker();
            item.set_marker(marker & !marker_mask);
        }
    }

    /// All indexed items carrying any of the given marker bits.
    pub fn find_by_marker(&self, marker: Marker) -> Vec<ItemId> {
        self.index
            .iter()
            .filter(|id| self.items.item(*id).marker().intersects(marker))
            .collect()
    }

    /// Remove every indexed item carrying any of the given marker bits.
    pub fn remove_by_marker(&mut self, marker: Marker) {
        let garbage = self.find_by_marker(marker);
        for id in garbage {
            self.remove(id);
        }
    }

    // ----- internals -----

    fn record_add(&mut self, item: Item) -> ItemId {
        let id = self.items.alloc(item);
        self.add_index(id);
        self.revisions.add_item(self.current, id);
        id
    }

    fn add_index(&mut self, id: ItemId) {
        let item = self.items.item(id);
        let (anchors, net, layers, bbox, kind) = (
            item.anchors(),
            item.net(),
            item.layers(),
            item.bbox(),
            item.kind(),
        );
        for pos in anchors {
            self.joints.link(pos, layers, net, JointLink { id, kind });
        }
        self.index.add(id, bbox, net);
    }

    fn remove_index(&mut self, id: ItemId) {
        let item = self.items.item(id);
        let (anchors, net, layers, bbox, kind, pos) = (
            item.anchors(),
            item.net(),
            item.layers(),
            item.bbox(),
            item.kind(),
            item.pos(),
        );
        if kind == ItemKind::VIA {
            // A via's joint may have been merged across layers; erase
            // every joint it overlaps and re-link the survivors under
            // their own layer ranges, which re-creates the per-layer
            // joints.
            let tag = JointTag { pos, net };
            let links = self.joints.remove_overlapping(tag, layers);
            for link in links {
                if link.id != id {
                    let survivor_layers = self.items.item(link.id).layers();
                    self.joints.link(pos, survivor_layers, net, link);
                }
            }
        } else {
            // Solids are only removed transiently (obstacle marking);
            // plain anchor unlinks cover solids and segments alike.
            for p in anchors {
                self.joints.unlink(p, layers, net, id);
            }
        }
        self.index.remove(id, bbox, net);
    }

    // Replay a revision's delta forward onto the index and joints.
    fn apply_revision(&mut self, rev: RevisionId) {
        let removed = self.revisions.removed(rev).to_vec();
        for id in removed {
            self.remove_index(id);
        }
        let added = self.revisions.added(rev).to_vec();
        for id in added {
            self.add_index(id);
        }
    }

    // Replay a revision's delta backward.
    fn undo_revision(&mut self, rev: RevisionId) {
        let added = self.revisions.added(rev).to_vec();
        for id in added {
            self.remove_index(id);
        }
        let removed = self.revisions.removed(rev).to_vec();
        for id in removed {
            self.add_index(id);
        }
    }

    // One directional walk of the joint graph from the seed segment.
    // Returns the (corner, segment) cells in walk order and whether the
    // loop guard fired.
    fn follow_line(
        &self,
        seed: ItemId,
        scan_forward: bool,
        stop_at_locked: bool,
    ) -> (Vec<(VecI, ItemId)>, bool) {
        let seed_seg = self.items.item(seed).seg();
        let guard = if scan_forward { seed_seg.b } else { seed_seg.a };
        let mut out = Vec::new();
        let mut current = seed;
        let mut prev_reversed = false;
        let mut count = 0_usize;
        loop {
            let cur_seg = self.items.item(current).seg();
            let p = if scan_forward ^ prev_reversed {
                cur_seg.b
            } else {
                cur_seg.a
            };
            let joint = self
                .find_joint_for_item(p, current)
                .expect("linked segment has a joint at each end");
            out.push((joint.pos(), current));

            if count > 0 && p == guard {
                return (out, true);
            }
            let locked = stop_at_locked && joint.is_locked();
            if locked || !joint.is_line_corner() {
                return (out, false);
            }

            current = joint
                .next_segment(current)
                .expect("line corner has a next segment");
            let next_seg = self.items.item(current).seg();
            prev_reversed = joint.pos()
                == if scan_forward {
                    next_seg.b
                } else {
                    next_seg.a
                };
            count += 1;
        }
    }
}
