//! Allocation-site heap model.
//!
//! Interns one object per allocation statement and one taint object per
//! (source call, type) pair, handing out dense [`ObjId`]s from a single
//! pool so points-to sets can mix ordinary and taint objects freely.

use rustc_hash::FxHashMap;

use crate::features::pointer_analysis::domain::ObjId;
use crate::features::pointer_analysis::ports::{HeapModel, ObjData, ObjKind};
use crate::shared::models::{InvokeId, StmtId, TypeId};

#[derive(Debug, Default)]
pub struct AllocSiteHeapModel {
    objs: Vec<ObjData>,
    alloc_index: FxHashMap<StmtId, ObjId>,
    taint_index: FxHashMap<(InvokeId, TypeId), ObjId>,
}

impl AllocSiteHeapModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, data: ObjData) -> ObjId {
        let id = ObjId(self.objs.len() as u32);
        self.objs.push(data);
        id
    }

    pub fn num_objs(&self) -> usize {
        self.objs.len()
    }

    pub fn num_taint_objs(&self) -> usize {
        self.taint_index.len()
    }
}

impl HeapModel for AllocSiteHeapModel {
    fn obj_of_alloc(&mut self, site: StmtId, ty: TypeId) -> ObjId {
        if let Some(&id) = self.alloc_index.get(&site) {
            return id;
        }
        let id = self.intern(ObjData {
            kind: ObjKind::Alloc { site },
            ty,
        });
        self.alloc_index.insert(site, id);
        id
    }

    fn make_taint(&mut self, source: InvokeId, ty: TypeId) -> ObjId {
        if let Some(&id) = self.taint_index.get(&(source, ty)) {
            return id;
        }
        let id = self.intern(ObjData {
            kind: ObjKind::Taint { source },
            ty,
        });
        self.taint_index.insert((source, ty), id);
        id
    }

    fn obj(&self, id: ObjId) -> &ObjData {
        &self.objs[id.index()]
    }
}
